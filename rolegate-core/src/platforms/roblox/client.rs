// File: rolegate-core/src/platforms/roblox/client.rs

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use rolegate_common::error::Error;
use rolegate_common::models::inventory::{InventoryItem, SortOrder};
use rolegate_common::models::roblox::{GroupMembership, PlayerProfile};
use rolegate_common::traits::api::GamePlatformClient;

const USER_AGENT: &str = "RoleGate/1.0 (+discord role verification)";
const CSRF_HEADER: &str = "x-csrf-token";

/// Base URLs of the Roblox web APIs the bot talks to.
#[derive(Debug, Clone)]
pub struct RobloxEndpoints {
    pub users: String,
    pub inventory: String,
    pub avatar: String,
    pub groups: String,
    pub thumbnails: String,
}

impl Default for RobloxEndpoints {
    fn default() -> Self {
        Self {
            users: "https://users.roblox.com".into(),
            inventory: "https://inventory.roblox.com".into(),
            avatar: "https://avatar.roblox.com".into(),
            groups: "https://groups.roblox.com".into(),
            thumbnails: "https://thumbnails.roblox.com".into(),
        }
    }
}

impl RobloxEndpoints {
    /// Every API under one host. Used against a local mock server.
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            users: base.clone(),
            inventory: base.clone(),
            avatar: base.clone(),
            groups: base.clone(),
            thumbnails: base,
        }
    }
}

/// JSON shape for `POST /v1/usernames/users`.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct UsernameLookupJson {
    data: Vec<Value>,
}

/// JSON shape for `GET /v1/users/{id}`.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
struct UserJson {
    id: Value,
    name: String,
    display_name: String,
    description: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
struct CurrentlyWearingJson {
    asset_ids: Vec<Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GroupRolesJson {
    data: Vec<GroupRoleEntryJson>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GroupRoleEntryJson {
    group: GroupRefJson,
    role: RoleJson,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GroupRefJson {
    id: Value,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RoleJson {
    id: Value,
    name: String,
    rank: u8,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
struct ThumbnailJson {
    data: Vec<ThumbnailEntryJson>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
struct ThumbnailEntryJson {
    state: String,
    image_url: Option<String>,
}

/// Maps a non-success status onto the error taxonomy the rest of the bot
/// matches on.
pub fn classify_status(status: StatusCode, context: &str, body: &str) -> Error {
    let msg = format!("{context} => HTTP {status}, {body}");
    match status.as_u16() {
        401 | 403 => Error::Forbidden(msg),
        400 => Error::BadRequest(msg),
        404 => Error::NotFound(msg),
        429 => Error::RateLimited(msg),
        _ => Error::Platform(msg),
    }
}

/// Numeric ids arrive as JSON numbers or as digit strings.
pub fn parse_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Flattens any inventory response shape into canonical items tagged with
/// `category`. Entries without a readable id are dropped.
pub fn normalize_inventory(body: &Value, category: &str) -> Vec<InventoryItem> {
    let entries = body
        .get("data")
        .and_then(Value::as_array)
        .or_else(|| body.as_array())
        .or_else(|| {
            body.get("data")
                .and_then(|d| d.get("collectibleItems"))
                .and_then(Value::as_array)
        });

    let Some(entries) = entries else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let item_id = ["assetId", "id", "assetID", "ID"]
                .iter()
                .find_map(|key| entry.get(*key).and_then(parse_id))?;
            let item_name = ["name", "assetName"]
                .iter()
                .find_map(|key| entry.get(*key).and_then(Value::as_str))
                .unwrap_or("Unknown Item")
                .to_string();
            Some(InventoryItem {
                item_id,
                item_name,
                category: category.to_string(),
            })
        })
        .collect()
}

/// Roblox web API calls, optionally authenticated with a `.ROBLOSECURITY`
/// session cookie.
pub struct RobloxClient {
    http_client: Client,
    cookie: Option<String>,
    csrf_token: RwLock<Option<String>>,
    endpoints: RobloxEndpoints,
}

impl RobloxClient {
    pub fn new(cookie: Option<&str>) -> Result<Self, Error> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Platform(format!("Failed to build reqwest client: {e}")))?;

        Ok(Self {
            http_client: client,
            cookie: cookie.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            csrf_token: RwLock::new(None),
            endpoints: RobloxEndpoints::default(),
        })
    }

    pub fn with_endpoints(mut self, endpoints: RobloxEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Whether a session cookie was supplied. Group ranking needs one.
    pub fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.cookie {
            Some(cookie) => req.header("Cookie", format!(".ROBLOSECURITY={cookie}")),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, context: &str) -> Result<Response, Error> {
        let resp = self
            .authed(req)
            .send()
            .await
            .map_err(|e| Error::Platform(format!("{context}: request failed => {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let txt = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, context, &txt));
        }
        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder, context: &str) -> Result<T, Error> {
        let resp = self.send(req, context).await?;
        resp.json::<T>()
            .await
            .map_err(|e| Error::Platform(format!("Parsing {context} => {e}")))
    }

    /// Sends a mutating request, refreshing the CSRF token once if Roblox
    /// rejects the current one.
    async fn send_mutation(
        &self,
        build: impl Fn() -> RequestBuilder,
        context: &str,
    ) -> Result<Response, Error> {
        for attempt in 0..2 {
            let mut req = self.authed(build());
            if let Some(token) = self.csrf_token.read().await.as_deref() {
                req = req.header(CSRF_HEADER, token);
            }

            let resp = req
                .send()
                .await
                .map_err(|e| Error::Platform(format!("{context}: request failed => {e}")))?;

            if resp.status() == StatusCode::FORBIDDEN && attempt == 0 {
                let fresh = resp
                    .headers()
                    .get(CSRF_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                if let Some(fresh) = fresh {
                    debug!("{context}: refreshed CSRF token, retrying");
                    *self.csrf_token.write().await = Some(fresh);
                    continue;
                }
            }

            if !resp.status().is_success() {
                let status = resp.status();
                let txt = resp.text().await.unwrap_or_default();
                return Err(classify_status(status, context, &txt));
            }
            return Ok(resp);
        }
        Err(Error::Auth(format!("{context}: CSRF token rejected twice")))
    }
}

#[async_trait]
impl GamePlatformClient for RobloxClient {
    async fn resolve_username(&self, username: &str) -> Result<Option<u64>, Error> {
        let url = format!("{}/v1/usernames/users", self.endpoints.users);
        let body = json!({ "usernames": [username], "excludeBannedUsers": false });
        let parsed: UsernameLookupJson = self
            .send_json(self.http_client.post(&url).json(&body), "POST /v1/usernames/users")
            .await?;

        Ok(parsed
            .data
            .first()
            .and_then(|entry| entry.get("id"))
            .and_then(parse_id))
    }

    async fn get_profile(&self, account_id: u64) -> Result<PlayerProfile, Error> {
        let url = format!("{}/v1/users/{account_id}", self.endpoints.users);
        let user: UserJson = self
            .send_json(self.http_client.get(&url), &format!("GET /v1/users/{account_id}"))
            .await?;

        Ok(PlayerProfile {
            account_id: parse_id(&user.id).unwrap_or(account_id),
            username: user.name,
            display_name: user.display_name,
            description: user.description,
        })
    }

    async fn get_inventory_page(
        &self,
        account_id: u64,
        category: &str,
        sort_order: SortOrder,
        limit: u32,
    ) -> Result<Vec<InventoryItem>, Error> {
        let url = format!("{}/v2/users/{account_id}/inventory", self.endpoints.inventory);
        let limit = limit.to_string();
        let req = self.http_client.get(&url).query(&[
            ("assetTypes", category),
            ("limit", limit.as_str()),
            ("sortOrder", sort_order.as_str()),
        ]);
        let body: Value = self
            .send_json(req, &format!("GET inventory {category} for {account_id}"))
            .await?;
        Ok(normalize_inventory(&body, category))
    }

    async fn get_current_worn_items(&self, account_id: u64) -> Result<Vec<u64>, Error> {
        let url = format!("{}/v1/users/{account_id}/currently-wearing", self.endpoints.avatar);
        let worn: CurrentlyWearingJson = self
            .send_json(self.http_client.get(&url), "GET currently-wearing")
            .await?;
        Ok(worn.asset_ids.iter().filter_map(parse_id).collect())
    }

    async fn get_group_rank(&self, account_id: u64, group_id: u64) -> Result<Option<GroupMembership>, Error> {
        let url = format!("{}/v2/users/{account_id}/groups/roles", self.endpoints.groups);
        let roles: GroupRolesJson = self
            .send_json(self.http_client.get(&url), "GET groups/roles")
            .await?;

        Ok(roles
            .data
            .into_iter()
            .find(|entry| parse_id(&entry.group.id) == Some(group_id))
            .and_then(|entry| {
                Some(GroupMembership {
                    group_id,
                    role_id: parse_id(&entry.role.id)?,
                    role_name: entry.role.name,
                    rank: entry.role.rank,
                })
            }))
    }

    async fn set_group_rank(&self, account_id: u64, group_id: u64, role_id: u64) -> Result<(), Error> {
        if !self.has_session() {
            return Err(Error::Auth("No Roblox session cookie configured".into()));
        }
        let url = format!("{}/v1/groups/{group_id}/users/{account_id}", self.endpoints.groups);
        let body = json!({ "roleId": role_id });
        self.send_mutation(
            || self.http_client.patch(&url).json(&body),
            &format!("PATCH group {group_id} member {account_id}"),
        )
        .await?;
        info!("Set group {} role of {} to {}", group_id, account_id, role_id);
        Ok(())
    }

    async fn get_current_bot_account_id(&self) -> Result<u64, Error> {
        if !self.has_session() {
            return Err(Error::Auth("No Roblox session cookie configured".into()));
        }
        let url = format!("{}/v1/users/authenticated", self.endpoints.users);
        let me: Value = self
            .send_json(self.http_client.get(&url), "GET /v1/users/authenticated")
            .await?;
        me.get("id")
            .and_then(parse_id)
            .ok_or_else(|| Error::Platform("No user id returned by /v1/users/authenticated".into()))
    }

    async fn get_avatar_headshot_url(&self, account_id: u64) -> Result<Option<String>, Error> {
        let url = format!("{}/v1/users/avatar-headshot", self.endpoints.thumbnails);
        let account = account_id.to_string();
        let req = self.http_client.get(&url).query(&[
            ("userIds", account.as_str()),
            ("size", "150x150"),
            ("format", "Png"),
            ("isCircular", "true"),
        ]);
        let thumbs: ThumbnailJson = self.send_json(req, "GET avatar-headshot").await?;

        let entry = thumbs.data.into_iter().next();
        if let Some(entry) = &entry {
            if entry.state != "Completed" && !entry.state.is_empty() {
                warn!("Headshot for {} not ready: state={}", account_id, entry.state);
            }
        }
        Ok(entry.and_then(|e| e.image_url).filter(|u| !u.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer, cookie: Option<&str>) -> RobloxClient {
        RobloxClient::new(cookie)
            .unwrap()
            .with_endpoints(RobloxEndpoints::single(&server.uri()))
    }

    #[test]
    fn test_status_classification() {
        let kind = |code: u16| classify_status(StatusCode::from_u16(code).unwrap(), "t", "");
        assert!(matches!(kind(401), Error::Forbidden(_)));
        assert!(matches!(kind(403), Error::Forbidden(_)));
        assert!(matches!(kind(400), Error::BadRequest(_)));
        assert!(matches!(kind(404), Error::NotFound(_)));
        assert!(matches!(kind(429), Error::RateLimited(_)));
        assert!(matches!(kind(503), Error::Platform(_)));
    }

    #[test]
    fn test_normalize_accepts_every_shape() {
        let data = json!({ "data": [{ "assetId": 8902806997u64, "name": "Shirt A" }] });
        let bare = json!([{ "id": "8902806997", "assetName": "Shirt A" }]);
        let collectibles = json!({ "data": { "collectibleItems": [{ "assetID": 8902806997u64, "name": "Shirt A" }] } });

        for body in [data, bare, collectibles] {
            let items = normalize_inventory(&body, "Shirt");
            assert_eq!(
                items,
                vec![InventoryItem {
                    item_id: 8902806997,
                    item_name: "Shirt A".into(),
                    category: "Shirt".into()
                }]
            );
        }
    }

    #[test]
    fn test_normalize_skips_entries_without_id() {
        let body = json!({ "data": [{ "name": "nameless" }, { "ID": 5 }] });
        let items = normalize_inventory(&body, "Hat");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_id, 5);
        assert_eq!(items[0].item_name, "Unknown Item");
        assert!(normalize_inventory(&json!({ "nothing": true }), "Hat").is_empty());
    }

    #[tokio::test]
    async fn test_resolve_username() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/usernames/users"))
            .and(body_json(json!({ "usernames": ["Zed"], "excludeBannedUsers": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "requestedUsername": "Zed", "id": 555, "name": "Zed", "displayName": "Zed" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/usernames/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let client = test_client(&server, None);
        assert_eq!(client.resolve_username("Zed").await.unwrap(), Some(555));
        assert_eq!(client.resolve_username("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_inventory_page_query_and_private_inventory() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/users/555/inventory"))
            .and(query_param("assetTypes", "Shirt"))
            .and(query_param("limit", "100"))
            .and(query_param("sortOrder", "Asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "assetId": 1, "name": "Tee" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/users/555/inventory"))
            .and(query_param("assetTypes", "Hat"))
            .respond_with(ResponseTemplate::new(403).set_body_string("You don't have permissions"))
            .mount(&server)
            .await;

        let client = test_client(&server, None);
        let shirts = client.get_inventory_page(555, "Shirt", SortOrder::Asc, 100).await.unwrap();
        assert_eq!(shirts[0].category, "Shirt");

        let err = client.get_inventory_page(555, "Hat", SortOrder::Asc, 100).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_set_group_rank_refreshes_csrf_token() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1/groups/77/users/555"))
            .and(header(CSRF_HEADER, "fresh-token"))
            .and(body_json(json!({ "roleId": 101215413u64 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/v1/groups/77/users/555"))
            .respond_with(ResponseTemplate::new(403).insert_header(CSRF_HEADER, "fresh-token"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, Some("cookie-value"));
        client.set_group_rank(555, 77, 101215413).await.unwrap();
    }

    #[tokio::test]
    async fn test_group_rank_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/users/555/groups/roles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "group": { "id": 12 }, "role": { "id": 1, "name": "Guest", "rank": 1 } },
                    { "group": { "id": 77 }, "role": { "id": 101215367, "name": "Half", "rank": 20 } }
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server, None);
        let membership = client.get_group_rank(555, 77).await.unwrap().unwrap();
        assert_eq!(membership.role_id, 101215367);
        assert_eq!(membership.rank, 20);
        assert!(client.get_group_rank(555, 99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ranking_without_cookie_is_auth_error() {
        let server = MockServer::start().await;
        let client = test_client(&server, None);
        assert!(matches!(client.set_group_rank(1, 2, 3).await, Err(Error::Auth(_))));
        assert!(matches!(client.get_current_bot_account_id().await, Err(Error::Auth(_))));
    }
}
