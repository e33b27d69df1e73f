use actix_web::HttpRequest;
use sqlx::MySqlPool;
use std::net::IpAddr;

/// One audit entry; the actor and client address are added by [`record`].
#[derive(Debug, Default)]
pub struct Activity<'a> {
    pub action: &'a str,
    pub table: Option<&'a str>,
    pub object_id: Option<u64>,
    pub details: Option<String>,
}

impl<'a> Activity<'a> {
    pub fn new(action: &'a str) -> Self {
        Self {
            action,
            ..Default::default()
        }
    }

    pub fn on(mut self, table: &'a str, object_id: u64) -> Self {
        self.table = Some(table);
        self.object_id = Some(object_id);
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// First `X-Forwarded-For` hop when it parses as an address, else the peer
/// address. Always fits `activity_log.ip_address`.
pub fn client_ip(req: &HttpRequest) -> Option<String> {
    let forwarded = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .and_then(|hop| hop.trim().parse::<IpAddr>().ok());

    forwarded
        .or_else(|| req.peer_addr().map(|addr| addr.ip()))
        .map(|ip| ip.to_string())
}

/// Appends to `activity_log`. Never fails the caller: audit problems are
/// logged and swallowed.
pub async fn record(pool: &MySqlPool, user_id: u64, req: &HttpRequest, activity: Activity<'_>) {
    let ip = client_ip(req);

    let result = sqlx::query(
        r#"
        INSERT INTO activity_log (user_id, action, occurred_at, table_name, object_id, ip_address, details)
        VALUES (?, ?, UTC_TIMESTAMP(), ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(activity.action)
    .bind(activity.table)
    .bind(activity.object_id)
    .bind(&ip)
    .bind(&activity.details)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::error!(error = %e, user_id, action = activity.action, "Failed to record activity");
    }
}
