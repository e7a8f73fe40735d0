//! Collection listing for scripts and non-interactive use.

use anyhow::{Context, Result};
use finq_core::api::{Collection, ResourceClient};
use finq_core::config::Config;
use finq_core::identity::IdentityClient;
use finq_types::{Budget, Report, Transaction};

pub async fn list(config: &Config, name: &str) -> Result<()> {
    let Some(collection) = Collection::from_name(name) else {
        anyhow::bail!(
            "Unknown collection '{name}'. \
             Valid collections: transactions, budgets, reports, dashboard, profile"
        );
    };

    let identity = IdentityClient::new(config.identity.clone());
    let session = identity
        .fetch_session()
        .await
        .map_err(|_| anyhow::anyhow!("Not signed in. Run `finq login` first."))?;
    let user_id = session
        .user_id
        .ok_or_else(|| anyhow::anyhow!("Not signed in. Run `finq login` first."))?;

    let api = ResourceClient::new(&config.api).with_user(user_id);

    let output = match collection {
        Collection::Transactions => to_pretty(&api.list::<Transaction>(collection).await?)?,
        Collection::Budgets => to_pretty(&api.list::<Budget>(collection).await?)?,
        Collection::Reports => to_pretty(&api.list::<Report>(collection).await?)?,
        Collection::Dashboard => to_pretty(&api.dashboard_summary().await?)?,
        Collection::Profile => to_pretty(&api.fetch_profile().await?)?,
    };
    println!("{output}");
    Ok(())
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("serialize response")
}
