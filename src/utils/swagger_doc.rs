use crate::utils::error::AppError;
use rocket_okapi::okapi::openapi3::{Response, Responses, MediaType};
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::RefOr;
use okapi::openapi3::SchemaObject;
use indexmap::IndexMap;
use serde_json::json;

impl OpenApiResponderInner for AppError {
    fn responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();

        // Every error variant a reservation endpoint can surface
        let error_responses = [
            (
                AppError::ValidationError("Identification must have exactly 10 digits".to_string()),
                "Bad Request",
            ),
            (AppError::NotFound("Trip not found".to_string()), "NotFound"),
            (AppError::Conflict("Seats already reserved: 12".to_string()), "Conflict"),
            (AppError::Unprocessable("Unprocessable".to_string()), "Unprocessable"),
            (AppError::ExternalService("Object storage unavailable".to_string()), "BadGateway"),
            (AppError::DatabaseError("Internal ServerError".to_string()), "InternalServerError"),
        ];

        for (error, description) in error_responses {
            responses.responses.insert(
                error.status().code.to_string(),
                RefOr::Object(Response {
                    description: description.to_string(),
                    content: {
                        let mut content = IndexMap::new();
                        content.insert(
                            "application/json".to_string(),
                            MediaType {
                                schema: Some(SchemaObject::default()),
                                example: Some(json!({
                                    "error": error.to_string()
                                })),
                                ..Default::default()
                            },
                        );
                        content
                    },
                    ..Default::default()
                }),
            );
        }

        Ok(responses)
    }
}
