//! HTTP server definitions.

use std::{sync::Arc, time};

use axum::{
    extract::MatchedPath,
    routing::{get, on, MethodFilter},
    Extension, Router,
};
use axum_client_ip::InsecureClientIp;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{api, graphql, Service};

/// Path the GraphQL API is served on.
pub const GRAPHQL_PATH: &str = "/graphql";

/// Path the [GraphiQL] IDE is served on.
///
/// [GraphiQL]: https://github.com/graphql/graphiql
pub const GRAPHIQL_PATH: &str = "/graphiql";

/// Creates a new [`CorsLayer`] allowing the provided `origins`.
///
/// # Errors
///
/// If any of the `origins` is not a valid header value.
pub fn cors(
    origins: &[String],
) -> Result<CorsLayer, http::header::InvalidHeaderValue> {
    origins.iter().try_fold(
        CorsLayer::new()
            .allow_methods([
                http::Method::GET,
                http::Method::OPTIONS,
                http::Method::POST,
            ])
            .allow_headers([
                http::header::AUTHORIZATION,
                http::header::CONTENT_TYPE,
            ]),
        |cors, origin| {
            Ok(cors.allow_origin(
                origin.parse::<http::header::HeaderValue>()?,
            ))
        },
    )
}

/// Creates a new [`Router`] serving the GraphQL API of the provided
/// [`Service`].
pub fn router(service: Service, cors: CorsLayer) -> Router {
    Router::new()
        .route(
            GRAPHQL_PATH,
            on(MethodFilter::GET.or(MethodFilter::POST), graphql),
        )
        .route(
            GRAPHIQL_PATH,
            get(juniper_axum::graphiql(GRAPHQL_PATH, None::<&str>)),
        )
        .layer(Extension(Arc::new(api::schema())))
        .layer(Extension(service))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|r: &http::Request<_>| {
                    tracing::info_span!(
                        "HTTP request",
                        http.client_ip = InsecureClientIp::from(
                            r.headers(),
                            r.extensions()
                        )
                            .map(|ip| ip.0.to_string())
                            .ok(),
                        http.flavor = ?r.version(),
                        http.host = r.uri().host(),
                        http.method = r.method().as_str(),
                        http.route = r
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str),
                        http.target = r
                            .uri()
                            .path_and_query()
                            .map(http::uri::PathAndQuery::as_str),
                        http.user_agent = r
                            .headers()
                            .get(http::header::USER_AGENT)
                            .and_then(|h| h.to_str().ok()),
                        http.status_code = tracing::field::Empty,
                    )
                })
                .on_response(
                    |r: &http::Response<_>,
                     dur: time::Duration,
                     span: &tracing::Span| {
                        let status = r.status();
                        span.record(
                            "http.status_code",
                            tracing::field::display(status.as_u16()),
                        );

                        let duration = format!("{}ms", dur.as_millis());
                        if status.is_server_error() {
                            tracing::error!(duration);
                        } else if status.is_client_error() {
                            tracing::warn!(duration);
                        } else {
                            tracing::info!(duration);
                        }
                    },
                ),
        )
}
