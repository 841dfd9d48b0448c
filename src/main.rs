//! otelkit demo service.
//!
//! A small axum service instrumented end to end with [`OtelKit`].
//!
//! ```text
//!     Client Request
//!         → http_middleware (span "<METHOD> <path>", start log)
//!         → handler (RequestContext → façade helpers)
//!         → http_middleware (status, metrics, completion log)
//!     Client Response
//!
//!     Prometheus scrape → 0.0.0.0:<prometheus_port>/metrics
//! ```
//!
//! Routes:
//! - `GET /` liveness
//! - `GET /users/{id}` cache lookup then database read (`0` is never found)
//! - `POST /checkout` payment call, inventory batch, timed processing
//! - `GET /fail` always 500

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use otelkit::config::{load_config, resolve, ConfigOverrides};
use otelkit::{
    http_middleware, metrics_handler, shutdown_signal, Context, KeyValue, OtelKit, RequestContext,
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "otelkit-demo")]
#[command(about = "Demo service instrumented with otelkit", long_about = None)]
struct Cli {
    /// TOML file of configuration overrides
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("user {0} not found")]
    UserNotFound(u64),
    #[error("order has no items")]
    EmptyOrder,
    #[error("payment declined for {0}")]
    PaymentDeclined(String),
    #[error("simulated failure")]
    Simulated,
}

#[derive(Clone, Debug, Serialize)]
struct User {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Order {
    customer: String,
    items: Vec<String>,
    #[serde(default)]
    audit: bool,
}

#[derive(Debug, Serialize)]
struct Receipt {
    customer: String,
    items: usize,
    processing_ms: u128,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "otelkit=info,otelkit_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => resolve(ConfigOverrides::default()),
    };

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        traces = %config.traces_exporter,
        metrics = %config.metrics_exporter,
        logs = %config.logs_exporter,
        "Configuration loaded"
    );

    let kit = Arc::new(OtelKit::new(config)?);

    if kit.prometheus_registry().is_some() {
        let addr = SocketAddr::from(([0, 0, 0, 0], kit.config().prometheus_port));
        let metrics_app = Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(kit.clone());
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(address = %addr, "Serving Prometheus metrics");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, metrics_app)
                .with_graceful_shutdown(shutdown_signal())
                .await
            {
                tracing::error!(error = %e, "Metrics server failed");
            }
        });
    }

    let app = Router::new()
        .route("/", get(root))
        .route("/users/{id}", get(get_user))
        .route("/checkout", post(checkout))
        .route("/fail", get(fail))
        .with_state(kit.clone())
        .layer(
            ServiceBuilder::new().layer(middleware::from_fn_with_state(kit.clone(), http_middleware)),
        );

    let listener = TcpListener::bind(cli.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Err(e) = kit.shutdown(SHUTDOWN_TIMEOUT).await {
        tracing::error!(error = %e, "Telemetry shutdown incomplete");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn root() -> &'static str {
    "ok"
}

async fn get_user(
    State(kit): State<Arc<OtelKit>>,
    RequestContext(cx): RequestContext,
    Path(id): Path<u64>,
) -> Result<Json<User>, StatusCode> {
    let cached = kit
        .cache_operation(&cx, "get", &format!("user:{id}"), |_| async {
            Ok::<Option<User>, DemoError>(None)
        })
        .await
        .unwrap_or_default();

    if let Some(user) = cached {
        return Ok(Json(user));
    }

    let user = kit
        .database_operation(&cx, "select", "users", |_| async move {
            if id == 0 {
                Err(DemoError::UserNotFound(id))
            } else {
                Ok(User {
                    id,
                    name: format!("user-{id}"),
                })
            }
        })
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;

    Ok(Json(user))
}

async fn checkout(
    State(kit): State<Arc<OtelKit>>,
    RequestContext(cx): RequestContext,
    Json(order): Json<Order>,
) -> Result<Json<Receipt>, StatusCode> {
    kit.set_attributes(
        &cx,
        &[
            KeyValue::new("order.customer", order.customer.clone()),
            KeyValue::new("order.items", order.items.len() as i64),
        ],
    );

    let customer = order.customer.clone();
    let (elapsed, result) = kit
        .timed_operation(&cx, "checkout.process", |cx| {
            let kit = kit.clone();
            async move { process_order(&kit, &cx, &order).await }
        })
        .await;

    match result {
        Ok(items) => {
            kit.record_metric("checkout", 1, &[KeyValue::new("success", true)]);
            Ok(Json(Receipt {
                customer,
                items,
                processing_ms: elapsed.as_millis(),
            }))
        }
        Err(DemoError::EmptyOrder) => Err(StatusCode::BAD_REQUEST),
        Err(e) => {
            let error: &dyn Display = &e;
            kit.log_error(&cx, "Checkout failed", Some(error), &[]);
            Err(StatusCode::PAYMENT_REQUIRED)
        }
    }
}

async fn process_order(kit: &OtelKit, cx: &Context, order: &Order) -> Result<usize, DemoError> {
    if order.items.is_empty() {
        return Err(DemoError::EmptyOrder);
    }

    kit.external_service_call(cx, "payments", "charge", |_| async {
        if order.customer.is_empty() {
            Err(DemoError::PaymentDeclined("anonymous customer".into()))
        } else {
            Ok(())
        }
    })
    .await?;

    let reserved = kit
        .batch_operation(cx, "reserve_inventory", order.items.len(), |cx| async move {
            for item in &order.items {
                kit.add_event(&cx, "item.reserved", &[KeyValue::new("item", item.clone())]);
            }
            Ok::<usize, DemoError>(order.items.len())
        })
        .await?;

    kit.conditional_trace(cx, order.audit, "checkout.audit", |cx| async move {
        kit.log_info(&cx, "Order audited", &[KeyValue::new("customer", order.customer.clone())]);
        Ok::<(), DemoError>(())
    })
    .await?;

    Ok(reserved)
}

async fn fail(State(kit): State<Arc<OtelKit>>, RequestContext(cx): RequestContext) -> StatusCode {
    let result = kit
        .trace_http_handler(&cx, "fail", |_| async { Err::<(), _>(DemoError::Simulated) })
        .await;

    if let Err(e) = result {
        kit.record_error(&cx, &e);
    }
    StatusCode::INTERNAL_SERVER_ERROR
}
