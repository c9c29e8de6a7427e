use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;
use redis::aio::MultiplexedConnection;
use tracing::info;

use crate::config::Config;

/// Opens the multiplexed Redis connection shared by every history call.
pub async fn connect_redis(redis_url: &str) -> Result<MultiplexedConnection> {
    info!("Connecting to Redis...");

    let client = redis::Client::open(redis_url).context("invalid REDIS_URL")?;
    let conn = client
        .get_multiplexed_tokio_connection()
        .await
        .context("Redis connection failed")?;

    info!("Redis connection established");
    Ok(conn)
}

/// Shared AWS configuration. Static keys are used when both are configured,
/// otherwise the default provider chain applies.
pub async fn load_aws_config(config: &Config) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()));

    if let (Some(key_id), Some(secret)) =
        (&config.aws_access_key_id, &config.aws_secret_access_key)
    {
        loader = loader.credentials_provider(Credentials::new(
            key_id,
            secret,
            None,
            None,
            "coach-static",
        ));
    }

    loader.load().await
}

/// S3 client; a custom endpoint (MinIO) switches to path-style addressing.
pub fn build_s3_client(sdk_config: &SdkConfig, endpoint: Option<&str>) -> aws_sdk_s3::Client {
    match endpoint {
        Some(endpoint) => {
            let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
                .endpoint_url(endpoint)
                .force_path_style(true)
                .build();
            aws_sdk_s3::Client::from_conf(s3_config)
        }
        None => aws_sdk_s3::Client::new(sdk_config),
    }
}
