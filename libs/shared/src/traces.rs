use std::env;

use anyhow::Result;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry::KeyValue;
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing::{error, info};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Registry,
};

/// Tracing 配置结构
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// 服务名称
    pub service_name: String,
    /// 服务版本
    pub service_version: String,
    /// 服务环境 (dev, staging, prod)
    pub environment: String,
    /// 采样率 (0.0-1.0)
    pub sample_rate: f64,
    /// OTLP collector endpoint (gRPC)
    pub otlp_endpoint: Option<String>,
    /// 未配置 collector 时是否把 span 打到 stdout
    pub trace_stdout: bool,
    /// 日志级别, RUST_LOG 优先
    pub log_level: String,
    /// 是否启用控制台输出
    pub console_output: bool,
    /// 是否启用JSON格式
    pub json_format: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "user-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            sample_rate: env::var("TRACE_SAMPLE_RATE")
                .unwrap_or_else(|_| "1.0".to_string())
                .parse()
                .unwrap_or(1.0),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            trace_stdout: env::var("TRACE_STDOUT")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            console_output: env::var("CONSOLE_OUTPUT")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            json_format: env::var("JSON_FORMAT")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }
}

impl TracingConfig {
    /// DEBUG 模式下使用 debug 级别和可读的文本输出
    pub fn with_debug(mut self, debug: bool) -> Self {
        if debug {
            if env::var("RUST_LOG").is_err() {
                self.log_level = "debug".to_string();
            }
            self.json_format = false;
        }
        self
    }

    fn sampler(&self) -> Sampler {
        if self.sample_rate >= 1.0 {
            Sampler::AlwaysOn
        } else if self.sample_rate <= 0.0 {
            Sampler::AlwaysOff
        } else {
            Sampler::TraceIdRatioBased(self.sample_rate)
        }
    }
}

/// 初始化 OpenTelemetry tracer, 既没有 collector 也没开 stdout 时返回 None
fn init_opentelemetry(config: &TracingConfig) -> Result<Option<SdkTracerProvider>> {
    use opentelemetry_otlp::WithExportConfig;

    let resource = Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", config.service_version.clone()),
            KeyValue::new("deployment.environment", config.environment.clone()),
            KeyValue::new("service.instance.id", uuid::Uuid::new_v4().to_string()),
        ])
        .build();

    let tracer_provider = if let Some(otlp_endpoint) = &config.otlp_endpoint {
        info!("Initializing OTLP tracer with endpoint: {}", otlp_endpoint);

        let exporter = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(otlp_endpoint)
            .build()?;

        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_batch_exporter(exporter)
            .with_sampler(config.sampler())
            .build()
    } else if config.trace_stdout {
        let exporter = opentelemetry_stdout::SpanExporter::default();

        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(exporter)
            .with_sampler(config.sampler())
            .build()
    } else {
        return Ok(None);
    };

    Ok(Some(tracer_provider))
}

/// 使用自定义配置初始化 tracing
pub fn init_tracing_with_config(config: TracingConfig) -> Result<TracingCleanup> {
    let mut cleanup = TracingCleanup::default();

    try_init_tracing(&config, &mut cleanup)?;

    Ok(cleanup)
}

fn try_init_tracing(config: &TracingConfig, cleanup: &mut TracingCleanup) -> Result<()> {
    // 1. 初始化 OpenTelemetry
    let tracer_provider = init_opentelemetry(config)?;
    cleanup.tracer_provider = tracer_provider.clone();

    // 2. 创建 OpenTelemetry layer
    let otel_layer = tracer_provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer()
            .with_error_records_to_exceptions(true)
            .with_tracer(provider.tracer("user-service"))
    });

    // 3. 创建环境过滤器
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;
    let registry = Registry::default().with(env_filter).with(otel_layer);

    // 4. 添加控制台输出层（如果启用）
    if config.console_output {
        if config.json_format {
            let fmt_layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_target(false)
                .with_level(true)
                .with_current_span(true);

            registry.with(fmt_layer).try_init()?;
        } else {
            let fmt_layer = fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_target(false)
                .with_level(true);

            registry.with(fmt_layer).try_init()?;
        }
    } else {
        registry.try_init()?;
    }

    info!(
        service_name = %config.service_name,
        service_version = %config.service_version,
        environment = %config.environment,
        sample_rate = %config.sample_rate,
        otlp_endpoint = ?config.otlp_endpoint,
        "Tracing initialized successfully"
    );

    if let Some(provider) = tracer_provider {
        global::set_tracer_provider(provider);
    }

    Ok(())
}

/// 清理资源的结构体
#[derive(Default)]
pub struct TracingCleanup {
    tracer_provider: Option<SdkTracerProvider>,
}

impl TracingCleanup {
    /// 执行清理操作
    pub fn cleanup(self) {
        if let Some(provider) = self.tracer_provider {
            if let Err(e) = provider.shutdown() {
                error!("Failed to shutdown tracer provider: {:?}", e);
            } else {
                info!("Tracer provider shutdown successfully");
            }
        }
    }
}
