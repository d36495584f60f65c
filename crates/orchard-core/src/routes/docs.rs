//! OpenAPI description of the service

use serde_json::{json, Value};

use crate::{AppState, Flow, Request, Response, StatusCode};

/// `GET /api-docs`
pub fn api_docs(_req: &Request, _state: &AppState) -> Flow {
    Response::json(StatusCode::OK, &openapi()).into()
}

fn id_param() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "description": "id of the fruit",
        "schema": { "type": "integer", "minimum": 1 }
    })
}

fn fruit_body() -> Value {
    json!({
        "required": true,
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/FruitInput" } } }
    })
}

fn fruit_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Fruit" } } }
    })
}

fn fruit_list_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Fruit" } }
            }
        }
    })
}

/// The OpenAPI 3 document
pub fn openapi() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "orchard",
            "description": "In-memory fruit stand",
            "version": env!("CARGO_PKG_VERSION")
        },
        "paths": {
            "/": {
                "get": {
                    "summary": "Homepage",
                    "parameters": [{
                        "name": "name",
                        "in": "query",
                        "required": false,
                        "description": "adds a welcome message",
                        "schema": { "type": "string" }
                    }],
                    "responses": {
                        "200": { "description": "The HTML to show on the homepage", "content": { "text/html": {} } }
                    }
                }
            },
            "/fruits": {
                "get": {
                    "tags": ["fruits"],
                    "summary": "List fruits",
                    "responses": { "200": fruit_list_response("Every fruit") }
                },
                "post": {
                    "tags": ["fruits"],
                    "summary": "Create a fruit",
                    "requestBody": fruit_body(),
                    "responses": {
                        "201": fruit_response("The created fruit"),
                        "400": { "description": "JSON body is not an object" }
                    }
                }
            },
            "/fruits/{id}": {
                "put": {
                    "tags": ["fruits"],
                    "summary": "Replace a fruit",
                    "parameters": [id_param()],
                    "requestBody": fruit_body(),
                    "responses": {
                        "200": fruit_response("The updated fruit"),
                        "400": { "description": "Invalid id or body" },
                        "404": { "description": "No fruit with that id" }
                    }
                },
                "patch": {
                    "tags": ["fruits"],
                    "summary": "Merge fields into a fruit",
                    "parameters": [id_param()],
                    "requestBody": fruit_body(),
                    "responses": {
                        "200": fruit_response("The merged fruit"),
                        "400": { "description": "Invalid id or body" },
                        "404": { "description": "No fruit with that id" }
                    }
                },
                "delete": {
                    "tags": ["fruits"],
                    "summary": "Delete a fruit",
                    "parameters": [id_param()],
                    "responses": {
                        "200": fruit_list_response("The remaining fruits"),
                        "400": { "description": "Non-numeric id" }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "FruitInput": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "count": { "type": "integer" }
                    }
                },
                "Fruit": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {
                        "id": { "type": "integer" },
                        "name": { "type": "string" },
                        "count": { "type": "integer" }
                    }
                }
            }
        }
    })
}
