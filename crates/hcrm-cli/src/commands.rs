//! Command handlers. Every command prints a single JSON document to stdout.

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde::Serialize;
use serde_json::json;

use hcrm_client::{CollectionRepository, CrmClient};
use hcrm_models::{FilterSpec, Record, SortSpec};

use crate::HotelsArgs;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{}", out);
    Ok(())
}

fn rfc3339(epoch: i64) -> Option<String> {
    Utc.timestamp_opt(epoch, 0).single().map(|t| t.to_rfc3339())
}

pub async fn login(client: &CrmClient) -> Result<()> {
    let session = client
        .session()
        .login(&client.config().credentials)
        .await
        .context("login failed")?;

    print_json(&json!({
        "authenticated": true,
        "expiresAt": rfc3339(session.expires_at),
    }))
}

pub fn logout(client: &CrmClient) -> Result<()> {
    client.session().logout()?;
    print_json(&json!({ "authenticated": false }))
}

pub async fn status(client: &CrmClient, refresh: bool) -> Result<()> {
    let refreshed = if refresh {
        Some(client.session().ensure_fresh().await?)
    } else {
        None
    };

    let authenticated = client.session().is_authenticated();
    let session = client.session().current_session();
    let now = Utc::now().timestamp();

    print_json(&json!({
        "authenticated": authenticated,
        "refreshed": refreshed,
        "expiresAt": session.as_ref().and_then(|s| rfc3339(s.expires_at)),
        "secondsRemaining": session.as_ref().map(|s| s.seconds_remaining_at(now)),
    }))
}

pub async fn hotels(client: &CrmClient, args: HotelsArgs) -> Result<()> {
    if args.all {
        let hotels = client
            .hotels()
            .list_all_batched(args.batch_size, args.max_batches)
            .await?;
        return print_json(&hotels);
    }

    let sort = args.sort.map(|field| SortSpec::new(field, args.order));
    let mut filter = FilterSpec::default();
    filter.location = args.location;
    filter.segment = args.segment;
    filter.sales_process = args.sales_process;
    filter.search_text = args.search;

    let page = client
        .hotels()
        .list(
            args.page,
            args.limit,
            sort.as_ref(),
            (!filter.is_empty()).then_some(&filter),
        )
        .await?;
    print_json(&page)
}

pub async fn search(client: &CrmClient, query: &str, page: u32, limit: u32) -> Result<()> {
    let result = client.hotels().search(query, page, limit).await?;
    print_json(&result)
}

pub async fn count(client: &CrmClient) -> Result<()> {
    let total = client.hotels().count().await?;
    print_json(&json!({ "total": total }))
}

pub async fn collection<T: Record>(repo: &CollectionRepository<T>, hotel: Option<&str>) -> Result<()> {
    let records = match hotel {
        Some(hotel_id) => repo.for_hotel(hotel_id).await?,
        None => repo.list_all().await?,
    };
    print_json(&records)
}
