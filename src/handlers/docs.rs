// handlers/docs.rs - API description and Swagger UI

use axum::{
    http::header,
    response::{Html, IntoResponse, Json},
};
use serde_json::Value;

use crate::error::ApiError;

/// OpenAPI description, compiled into the binary
pub const OPENAPI_YAML: &str = include_str!("openapi.yaml");

const SWAGGER_UI: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>Money Manager API - Swagger UI</title>
  <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui.css" />
  <style>
    html { box-sizing: border-box; overflow-y: scroll; }
    *, *:before, *:after { box-sizing: inherit; }
    body { margin: 0; background: #fafafa; }
  </style>
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-bundle.js"></script>
  <script src="https://unpkg.com/swagger-ui-dist@5.9.0/swagger-ui-standalone-preset.js"></script>
  <script>
    window.onload = function() {
      window.ui = SwaggerUIBundle({
        url: "/api/openapi.yaml",
        dom_id: '#swagger-ui',
        deepLinking: true,
        presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
        plugins: [SwaggerUIBundle.plugins.DownloadUrl],
        layout: "StandaloneLayout"
      });
    };
  </script>
</body>
</html>
"#;

/// GET /openapi.yaml, /api/openapi.yaml
pub async fn openapi_yaml() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/yaml")], OPENAPI_YAML)
}

/// GET /api/openapi.json
pub async fn openapi_json() -> Result<Json<Value>, ApiError> {
    serde_yaml::from_str::<Value>(OPENAPI_YAML).map(Json).map_err(|e| {
        tracing::error!("Embedded OpenAPI document is not valid YAML: {}", e);
        ApiError::internal_server_error("Failed to read OpenAPI spec")
    })
}

/// GET /docs, /swagger, /api/docs
pub async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    use crate::testing::TestApp;

    #[test]
    fn embedded_document_lists_every_resource() {
        let doc: Value = serde_yaml::from_str(OPENAPI_YAML).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        for path in ["/users", "/users/{id}", "/spending", "/spending/{id}", "/income", "/income/{id}", "/health"] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }

    #[tokio::test]
    async fn serves_yaml_json_and_html() {
        let app = TestApp::new();

        for path in ["/openapi.yaml", "/api/openapi.yaml"] {
            let (status, content_type, body) = app.get_text(path).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(content_type.as_deref(), Some("application/yaml"));
            assert!(body.starts_with("openapi:"));
        }

        let (status, doc) = app.get("/api/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(doc["info"]["title"], "Money Manager API");

        for path in ["/docs", "/swagger", "/api/docs"] {
            let (status, content_type, body) = app.get_text(path).await;
            assert_eq!(status, StatusCode::OK);
            assert!(content_type.unwrap_or_default().starts_with("text/html"));
            assert!(body.contains("/api/openapi.yaml"));
        }
    }
}
