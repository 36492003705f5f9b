//! OpenAPI document served at `/v3/api-docs`

use axum::Json;
use serde_json::{json, Value};

fn id_parameter() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    })
}

fn job_id_parameter() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string", "format": "uuid" }
    })
}

fn json_content(schema: &str) -> Value {
    json!({ "application/json": { "schema": { "$ref": format!("#/components/schemas/{schema}") } } })
}

fn json_array(schema: &str) -> Value {
    json!({
        "application/json": {
            "schema": {
                "type": "array",
                "items": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

fn problem(description: &str) -> Value {
    json!({ "description": description, "content": { "application/problem+json": { "schema": { "$ref": "#/components/schemas/ProblemDetail" } } } })
}

/// Build the OpenAPI 3 description of every route
pub fn document() -> Value {
    json!({
        "openapi": "3.0.1",
        "info": {
            "title": "Geosections API",
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "version": env!("CARGO_PKG_VERSION")
        },
        "security": [{ "basicAuth": [] }],
        "paths": {
            "/api/v1/sections": {
                "get": {
                    "tags": ["sections"],
                    "summary": "List all sections",
                    "responses": { "200": { "description": "OK", "content": json_array("SectionResponse") } }
                },
                "post": {
                    "tags": ["sections"],
                    "summary": "Create a section with its geological classes",
                    "requestBody": { "required": true, "content": json_content("SectionRequest") },
                    "responses": {
                        "201": { "description": "Created", "content": json_content("SectionResponse") },
                        "400": problem("Validation failed")
                    }
                }
            },
            "/api/v1/sections/{id}": {
                "parameters": [id_parameter()],
                "get": {
                    "tags": ["sections"],
                    "summary": "Get a section",
                    "responses": {
                        "200": { "description": "OK", "content": json_content("SectionResponse") },
                        "404": problem("Section not found")
                    }
                },
                "put": {
                    "tags": ["sections"],
                    "summary": "Replace a section's name and classes",
                    "requestBody": { "required": true, "content": json_content("SectionRequest") },
                    "responses": {
                        "200": { "description": "OK", "content": json_content("SectionResponse") },
                        "400": problem("Validation failed"),
                        "404": problem("Section not found")
                    }
                },
                "delete": {
                    "tags": ["sections"],
                    "summary": "Delete a section and its classes",
                    "responses": { "204": { "description": "No Content" } }
                }
            },
            "/api/v1/sections/by-code": {
                "get": {
                    "tags": ["sections"],
                    "summary": "Find sections holding a class with the given code",
                    "parameters": [{ "name": "code", "in": "query", "required": true, "schema": { "type": "string" } }],
                    "responses": {
                        "200": { "description": "OK", "content": json_array("SectionResponse") },
                        "400": problem("Missing parameter")
                    }
                }
            },
            "/api/v1/geologicalClasses": {
                "get": {
                    "tags": ["geological classes"],
                    "summary": "List all geological classes",
                    "responses": { "200": { "description": "OK", "content": json_array("GeologicalClassResponse") } }
                },
                "post": {
                    "tags": ["geological classes"],
                    "summary": "Add a geological class to a section",
                    "parameters": [{ "name": "sectionId", "in": "query", "required": true, "schema": { "type": "integer", "format": "int64" } }],
                    "requestBody": { "required": true, "content": json_content("GeologicalClassRequest") },
                    "responses": {
                        "201": { "description": "Created", "content": json_content("GeologicalClassResponse") },
                        "400": problem("Validation failed"),
                        "404": problem("Section not found")
                    }
                }
            },
            "/api/v1/geologicalClasses/{id}": {
                "parameters": [id_parameter()],
                "get": {
                    "tags": ["geological classes"],
                    "summary": "Get a geological class",
                    "responses": {
                        "200": { "description": "OK", "content": json_content("GeologicalClassResponse") },
                        "404": problem("Geological Class not found")
                    }
                },
                "put": {
                    "tags": ["geological classes"],
                    "summary": "Update a geological class",
                    "requestBody": { "required": true, "content": json_content("GeologicalClassRequest") },
                    "responses": {
                        "200": { "description": "OK", "content": json_content("GeologicalClassResponse") },
                        "404": problem("Geological Class not found")
                    }
                },
                "delete": {
                    "tags": ["geological classes"],
                    "summary": "Delete a geological class",
                    "responses": { "204": { "description": "No Content" } }
                }
            },
            "/api/v1/export": {
                "get": {
                    "tags": ["export"],
                    "summary": "Start exporting all sections",
                    "parameters": [{ "name": "format", "in": "query", "required": false, "schema": { "type": "string", "enum": ["xlsx", "csv"], "default": "xlsx" } }],
                    "responses": { "200": { "description": "Job started", "content": json_content("JobIdResponse") } }
                }
            },
            "/api/v1/export/{id}": {
                "parameters": [job_id_parameter()],
                "get": {
                    "tags": ["export"],
                    "summary": "Get the state of an export job",
                    "responses": {
                        "200": { "description": "OK", "content": json_content("JobStateResponse") },
                        "404": problem("Job ID not found")
                    }
                }
            },
            "/api/v1/export/{id}/file": {
                "parameters": [job_id_parameter()],
                "get": {
                    "tags": ["export"],
                    "summary": "Download the file of a finished export",
                    "responses": {
                        "200": {
                            "description": "Exported file",
                            "content": {
                                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet": {},
                                "text/csv": {}
                            }
                        },
                        "404": problem("Job or file not found"),
                        "503": problem("Export is still in progress")
                    }
                }
            },
            "/api/v1/import": {
                "post": {
                    "tags": ["import"],
                    "summary": "Upload a spreadsheet of sections",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "multipart/form-data": {
                                "schema": {
                                    "type": "object",
                                    "required": ["file"],
                                    "properties": { "file": { "type": "string", "format": "binary" } }
                                }
                            }
                        }
                    },
                    "responses": {
                        "201": { "description": "Job started", "content": json_content("JobIdResponse") },
                        "400": problem("Not a multipart request or missing file part")
                    }
                }
            },
            "/api/v1/import/{id}": {
                "parameters": [job_id_parameter()],
                "get": {
                    "tags": ["import"],
                    "summary": "Get the state of an import job",
                    "responses": {
                        "200": { "description": "OK", "content": json_content("JobStateResponse") },
                        "404": problem("Job ID not found")
                    }
                }
            }
        },
        "components": {
            "securitySchemes": {
                "basicAuth": { "type": "http", "scheme": "basic" }
            },
            "schemas": {
                "GeologicalClassRequest": {
                    "type": "object",
                    "required": ["name", "code"],
                    "properties": {
                        "name": { "type": "string" },
                        "code": { "type": "string" }
                    }
                },
                "SectionRequest": {
                    "type": "object",
                    "required": ["name", "geologicalClasses"],
                    "properties": {
                        "name": { "type": "string" },
                        "geologicalClasses": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/GeologicalClassRequest" }
                        }
                    }
                },
                "SectionResponse": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "name": { "type": "string" },
                        "geologicalClasses": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/GeologicalClassRequest" }
                        }
                    }
                },
                "GeologicalClassResponse": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "name": { "type": "string" },
                        "code": { "type": "string" },
                        "sectionId": { "type": "integer", "format": "int64" }
                    }
                },
                "JobIdResponse": {
                    "type": "object",
                    "properties": { "id": { "type": "string", "format": "uuid" } }
                },
                "JobStateResponse": {
                    "type": "object",
                    "properties": { "state": { "type": "string", "enum": ["IN_PROGRESS", "DONE", "ERROR"] } }
                },
                "ProblemDetail": {
                    "type": "object",
                    "properties": {
                        "type": { "type": "string" },
                        "title": { "type": "string" },
                        "status": { "type": "integer" },
                        "detail": { "type": "string" },
                        "errors": { "type": "object", "additionalProperties": { "type": "string" } }
                    }
                }
            }
        }
    })
}

pub async fn openapi() -> Json<Value> {
    Json(document())
}
