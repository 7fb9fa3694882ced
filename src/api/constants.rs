//! API constants and path builders for the Tag Manager v2 REST API

/// Root of the Tag Manager v2 API
pub const API_BASE_URL: &str = "https://tagmanager.googleapis.com/tagmanager/v2";

pub const USER_AGENT: &str = concat!("gtm-clone/", env!("CARGO_PKG_VERSION"));

/// Usage context given to containers this tool creates
pub const WEB_USAGE_CONTEXT: &str = "web";

pub mod headers {
    pub const CONTENT_TYPE_JSON: &str = "application/json";
}

/// OAuth scopes required to read the source and write the destination
pub mod scopes {
    pub const EDIT_CONTAINERS: &str = "https://www.googleapis.com/auth/tagmanager.edit.containers";
    pub const READONLY: &str = "https://www.googleapis.com/auth/tagmanager.readonly";

    pub const ALL: [&str; 2] = [EDIT_CONTAINERS, READONLY];
}

/// `accounts/{account_id}`
pub fn account_path(account_id: &str) -> String {
    format!("accounts/{}", account_id)
}

/// `accounts/{account_id}/containers/{container_id}`
pub fn container_path(account_id: &str, container_id: &str) -> String {
    format!("{}/containers/{}", account_path(account_id), container_id)
}

/// `accounts/{account_id}/containers/{container_id}/workspaces/{workspace_id}`
pub fn workspace_path(account_id: &str, container_id: &str, workspace_id: &str) -> String {
    format!(
        "{}/workspaces/{}",
        container_path(account_id, container_id),
        workspace_id
    )
}

/// Full URL of a collection under a parent path
pub fn collection_endpoint(base_url: &str, parent: &str, collection: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), parent, collection)
}
