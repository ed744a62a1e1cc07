//! `whsnap run`: the end-to-end snapshot pipeline for one warehouse.

use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use whsnap_core::{load_catalog, AppConfig, ConfigError, NormalizedRecord};
use whsnap_scraper::{
    acquire_documents, archive_response, normalize, AuthController, CatalogDocument, CredentialStore,
    EnrichmentClient, EnrichmentSettings, FileDropCapture, RequestProfile, RetryPolicy,
    ScraperError, SearchClient, SearchParams, SessionContext,
};
use whsnap_snapshot::{publish, SnapshotPaths};

pub(crate) fn search_params(config: &AppConfig) -> SearchParams {
    SearchParams {
        base_url: config.search_base_url.clone(),
        category_url: config.search_category_url.clone(),
        eligibility: config.search_eligibility.clone(),
        locale: config.locale.clone(),
        rows: config.page_rows,
        inter_page_delay_ms: config.inter_page_delay_ms,
    }
}

pub(crate) fn enrichment_settings(config: &AppConfig) -> Result<EnrichmentSettings, ConfigError> {
    Ok(EnrichmentSettings {
        url: config.enrichment_url.clone(),
        client_id: config.enrichment_client_id()?.to_owned(),
        locales: vec![config.locale.clone()],
        batch_size: config.enrichment_batch_size,
        retry: RetryPolicy {
            max_attempts: config.enrichment_max_attempts,
            backoff_base_secs: config.enrichment_backoff_base_secs,
            backoff_cap_secs: config.enrichment_backoff_cap_secs,
        },
        inter_batch_delay_ms: config.inter_batch_delay_ms,
    })
}

pub(crate) async fn run_warehouse(config: &AppConfig, warehouse_id: &str) -> anyhow::Result<()> {
    let settings = enrichment_settings(config)?;
    let catalog = load_catalog(&config.warehouses_path).with_context(|| {
        format!(
            "failed to load warehouse catalog {}",
            config.warehouses_path.display()
        )
    })?;
    let Some(warehouse) = catalog.find(warehouse_id) else {
        bail!(
            "warehouse '{warehouse_id}' is not in {}; run `whsnap warehouses` to list ids",
            config.warehouses_path.display()
        );
    };
    let ctx = warehouse.context();
    tracing::info!(
        warehouse = %warehouse.id,
        name = %warehouse.name,
        number = %ctx.warehouse_number,
        "starting snapshot run"
    );

    let store = CredentialStore::new(&config.cookies_path);
    let credentials = store.load();
    let profile = RequestProfile::new(
        &config.user_agent,
        &config.referer,
        config.search_api_key.as_deref(),
    );
    let session = SessionContext::new(profile, credentials.as_ref());

    let search = SearchClient::new(config.request_timeout_secs, &search_params(config), &ctx)
        .context("failed to build search client")?;
    let capture = FileDropCapture::new(
        &config.capture_drop_path,
        Duration::from_secs(config.capture_timeout_secs),
        Duration::from_secs(config.capture_poll_secs.max(1)),
    );
    let auth = AuthController::new(store, capture);

    let acquisition = match acquire_documents(&search, &auth, session).await {
        Ok(acquisition) => acquisition,
        Err(ScraperError::Authorization { reason }) => bail!(
            "authorization failed for warehouse {}: {reason}. Sign in through the browser, \
             export its cookies to {}, and run again. No snapshot files were changed.",
            warehouse.id,
            config.capture_drop_path.display()
        ),
        Err(e) => return Err(e).context("catalog retrieval failed"),
    };

    if config.archive_raw_responses {
        if let Some(body) = &acquisition.probe_body {
            archive_response(&config.raw_dir, body, Utc::now());
        }
    }

    let documents = &acquisition.documents;
    let item_numbers: Vec<String> = documents
        .iter()
        .map(CatalogDocument::item_number)
        .collect();
    let enrichment = EnrichmentClient::new(config.request_timeout_secs, settings)
        .context("failed to build enrichment client")?;
    let payloads = enrichment
        .fetch(
            &acquisition.session,
            item_numbers.iter().map(String::as_str),
            &ctx,
        )
        .await;

    let records: Vec<NormalizedRecord> = documents
        .iter()
        .map(|doc| normalize(doc, &payloads, &ctx, &catalog.channel_policy))
        .collect();
    let classified = records
        .iter()
        .filter(|r| r.order_channel.is_decisive())
        .count();
    tracing::info!(
        records = records.len(),
        enriched = payloads.len(),
        classified,
        "normalized catalog"
    );

    let paths = SnapshotPaths::in_dir(&config.output_dir.join(&warehouse.id));
    let summary = publish(&paths, &records)
        .with_context(|| format!("failed to write snapshot under {}", paths.dir.display()))?;

    tracing::info!(
        warehouse = %warehouse.id,
        records = summary.records,
        added = summary.added,
        removed = summary.removed,
        changed = summary.changed,
        first_run = summary.first_run,
        reactive_refresh = acquisition.reactive_refresh,
        snapshot = %summary.current.display(),
        "snapshot run complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use whsnap_snapshot::read_snapshot;

    fn config(dir: &Path) -> AppConfig {
        AppConfig {
            log_level: "info".to_owned(),
            warehouses_path: dir.join("warehouses.yaml"),
            search_base_url: "http://127.0.0.1:1/search".to_owned(),
            search_api_key: Some("key".to_owned()),
            search_category_url: "/grocery-household.html".to_owned(),
            search_eligibility: Some("ShipIt".to_owned()),
            locale: "en-US".to_owned(),
            enrichment_url: "http://127.0.0.1:1/graphql".to_owned(),
            enrichment_client_id: Some("client".to_owned()),
            enrichment_batch_size: 50,
            enrichment_max_attempts: 2,
            enrichment_backoff_base_secs: 0,
            enrichment_backoff_cap_secs: 0,
            inter_batch_delay_ms: 0,
            request_timeout_secs: 2,
            user_agent: "whsnap-test".to_owned(),
            referer: "https://www.example.com/".to_owned(),
            page_rows: 10,
            inter_page_delay_ms: 0,
            cookies_path: dir.join("cookies.json"),
            capture_drop_path: dir.join("capture.json"),
            capture_timeout_secs: 0,
            capture_poll_secs: 1,
            output_dir: dir.join("out"),
            archive_raw_responses: false,
            raw_dir: dir.join("raw"),
        }
    }

    fn write_catalog(dir: &Path) {
        std::fs::write(
            dir.join("warehouses.yaml"),
            "warehouses:\n  - id: \"388\"\n    name: Naperville\n    state: IL\n    number: \"388\"\n    warehouse_filter: 388-wh\n    location_ids: [388-wh]\n",
        )
        .unwrap();
    }

    #[test]
    fn settings_follow_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());

        let search = search_params(&cfg);
        assert_eq!(search.rows, 10);
        assert_eq!(search.eligibility.as_deref(), Some("ShipIt"));

        let enrichment = enrichment_settings(&cfg).unwrap();
        assert_eq!(enrichment.client_id, "client");
        assert_eq!(enrichment.locales, vec!["en-US"]);
        assert_eq!(enrichment.batch_size, 50);
        assert_eq!(enrichment.retry.max_attempts, 2);
    }

    #[tokio::test]
    async fn unknown_warehouse_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path());

        let err = run_warehouse(&config(dir.path()), "999").await.unwrap_err();
        assert!(err.to_string().contains("'999'"));
    }

    #[tokio::test]
    async fn authorization_failure_leaves_outputs_untouched() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path());

        let err = run_warehouse(&config(dir.path()), "388").await.unwrap_err();
        assert!(err.to_string().contains("authorization failed"));
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn missing_client_id_fails_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path());
        let mut cfg = config(dir.path());
        cfg.enrichment_client_id = None;

        let err = run_warehouse(&cfg, "388").await.unwrap_err();
        assert!(err.to_string().contains("WHSNAP_ENRICHMENT_CLIENT_ID"));
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn unreachable_enrichment_falls_back_to_document_badges() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path());

        let server = MockServer::start().await;
        let doc = json!({
            "id": "1",
            "item_number": "100",
            "item_product_name": "Paper Towels",
            "item_location_pricing_salePrice": "$19.99",
            "deliveryStatus": "Available",
            "item_location_pill": ["Online Only"]
        });
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": {"numFound": 1, "docs": [doc]}})),
            )
            .mount(&server)
            .await;

        let mut cfg = config(dir.path());
        cfg.search_base_url = format!("{}/search", server.uri());

        run_warehouse(&cfg, "388").await.unwrap();

        let paths = SnapshotPaths::in_dir(&dir.path().join("out").join("388"));
        let rows = read_snapshot(&paths.current).unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id(), "1");
        assert_eq!(rows[0].get("order_channel"), Some("online_only"));
        assert_eq!(rows[0].get("price"), Some("$19.99"));

        run_warehouse(&cfg, "388").await.unwrap();
        assert!(paths.previous.exists());
        assert!(!paths.added.exists());
        assert!(!paths.removed.exists());
        assert!(!paths.changed.exists());
    }
}
