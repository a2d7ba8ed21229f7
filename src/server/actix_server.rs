//! Implementation of the actix server.

use std::collections::HashMap;

use actix_web::{
    get,
    http::{header, StatusCode},
    middleware::Logger,
    web::{self, Data, Json},
    App, HttpRequest, HttpResponse, HttpServer, Responder, ResponseError,
};
use serde::Serialize;

use crate::{err::MatchError, matching::schema::MatchResult};

use super::{Config, WebServerData};

/// Body of all error responses.
#[derive(Serialize, Debug)]
struct ErrorBody<'a> {
    reason: &'a str,
}

#[derive(Debug)]
struct CustomError {
    status: StatusCode,
    reason: String,
}

impl std::fmt::Display for CustomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl CustomError {
    /// Map `err` to its status; `verbose` includes error chain and backtrace for 500.
    fn new(err: &MatchError, verbose: bool) -> Self {
        match err {
            MatchError::Validation(e) => CustomError {
                status: StatusCode::BAD_REQUEST,
                reason: e.to_string(),
            },
            MatchError::Auth(e) => CustomError {
                status: StatusCode::FORBIDDEN,
                reason: e.to_string(),
            },
            MatchError::Backend(e) => CustomError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                reason: if verbose {
                    format!("{:?}", e)
                } else {
                    e.to_string()
                },
            },
        }
    }
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(ErrorBody {
            reason: &self.reason,
        })
    }
}

/// Authenticate, then validate and answer the query of `req`.
async fn answer_match(data: &WebServerData, req: &HttpRequest) -> Result<MatchResult, MatchError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let identity = data.authenticator.authenticate(authorization).await?;
    tracing::info!(
        "match request from {}: {}",
        identity.label(),
        req.query_string()
    );

    let params = web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .map_err(|e| anyhow::anyhow!("problem parsing query string: {}", e))?
        .into_inner();
    data.matcher.run(&params).await
}

/// Answer a beacon match query.
#[get("/match")]
async fn handle_match(
    data: Data<WebServerData>,
    req: HttpRequest,
) -> actix_web::Result<impl Responder, CustomError> {
    answer_match(&data, &req).await.map(Json).map_err(|err| {
        if let MatchError::Backend(e) = &err {
            let from = req
                .headers()
                .get(header::FROM)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::error!("problem answering match request from {}: {:?}", from, e);
        }
        CustomError::new(&err, data.verbose_errors)
    })
}

/// Register the gateway's routes.
fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handle_match);
}

#[actix_web::main]
pub async fn main(config: &Config, data: Data<WebServerData>) -> std::io::Result<()> {
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(configure)
            .wrap(Logger::default())
    })
    .bind((config.listen_host.as_str(), config.listen_port))?
    .run()
    .await
}
