use rocket_okapi::swagger_ui::SwaggerUIConfig;

// Served at /swagger, reading the OpenAPI document generated under /api
pub fn swagger_ui() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/api/openapi.json".to_string(),
        ..Default::default()
    }
}
