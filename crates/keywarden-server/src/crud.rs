//! The generic entity controller.
//!
//! Every CRUD operation follows the same sequence: authenticate →
//! authorize → resolve id / validate input → locate → mutate or
//! project → respond. [`EntityController`] owns that fixed algorithm;
//! everything entity-specific lives in a small [`EntityHooks`]
//! implementation (data preparation, store access, projections) plus a
//! [`CrudPolicy`] record declaring, per operation, whether
//! authentication is required and which permission — if any — the
//! operation demands. Each operation consults only its own declared
//! permission.

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, extract::Path, extract::Query, extract::State};
use serde_json::{Value, json};
use uuid::Uuid;

use keywarden_auth::config::AuthConfig;
use keywarden_core::repository::{PaginatedResult, Pagination};

use crate::errors::RestError;
use crate::principal::{Principal, optional_principal, require_principal};

/// Authentication/authorization requirements of one operation.
#[derive(Debug, Clone, Copy)]
pub struct OpPolicy {
    pub auth_required: bool,
    /// `None` means no specific permission beyond authentication.
    pub permission: Option<&'static str>,
}

impl OpPolicy {
    /// Anonymous access allowed.
    pub const fn open() -> Self {
        Self {
            auth_required: false,
            permission: None,
        }
    }

    /// Any authenticated principal.
    pub const fn authenticated() -> Self {
        Self {
            auth_required: true,
            permission: None,
        }
    }

    /// Authenticated principal holding the named permission.
    pub const fn requires(permission: &'static str) -> Self {
        Self {
            auth_required: true,
            permission: Some(permission),
        }
    }
}

/// Per-operation policy record for one entity.
#[derive(Debug, Clone, Copy)]
pub struct CrudPolicy {
    pub create: OpPolicy,
    pub delete: OpPolicy,
    pub list: OpPolicy,
    pub get: OpPolicy,
    pub edit: OpPolicy,
}

impl CrudPolicy {
    /// One permission for every operation — the common configuration.
    pub const fn uniform(permission: &'static str) -> Self {
        Self {
            create: OpPolicy::requires(permission),
            delete: OpPolicy::requires(permission),
            list: OpPolicy::requires(permission),
            get: OpPolicy::requires(permission),
            edit: OpPolicy::requires(permission),
        }
    }

    pub fn for_op(&self, op: Operation) -> OpPolicy {
        match op {
            Operation::Create => self.create,
            Operation::Delete => self.delete,
            Operation::List => self.list,
            Operation::Get => self.get,
            Operation::Edit => self.edit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Delete,
    List,
    Get,
    Edit,
}

/// Enforce an operation's declared permission against the principal.
///
/// The denial message names the acting username.
pub fn enforce(policy: OpPolicy, principal: Option<&Principal>) -> Result<(), RestError> {
    if let Some(required) = policy.permission {
        let principal = principal.ok_or(RestError::Unauthorized)?;
        if !principal.has_rights(required) {
            return Err(RestError::PermissionDenied(format!(
                "User {} has no \"{required}\" permissions",
                principal.username()
            )));
        }
    }
    Ok(())
}

/// Entity-specific capability set plugged into the controller.
pub trait EntityHooks: Send + Sync + 'static {
    type Entity: Send + Sync;
    type CreateData: Send;
    type EditData: Send;

    /// REST path segment; also the entity name in error messages.
    const CODE: &'static str;

    fn policy(&self) -> CrudPolicy;

    fn page_size(&self) -> u64 {
        10
    }

    /// Map a raw path id to a store id. Ids are opaque, so anything
    /// unparseable resolves like an absent record.
    fn prepare_id(&self, _principal: Option<&Principal>, raw: &str) -> Result<Uuid, RestError> {
        Uuid::parse_str(raw).map_err(|_| RestError::not_found(Self::CODE))
    }

    /// Per-operation gate. The default enforces the operation's own
    /// configured permission and nothing else; entities with
    /// id-dependent rules (e.g. "acting on yourself") override this.
    fn authorize(
        &self,
        op: Operation,
        principal: Option<&Principal>,
        _target: Option<Uuid>,
    ) -> Result<(), RestError> {
        enforce(self.policy().for_op(op), principal)
    }

    /// Validate the create body into store-ready data. Owns all
    /// field-level validation; failures are validation errors.
    fn prepare_create(
        &self,
        principal: Option<&Principal>,
        body: &Value,
    ) -> impl Future<Output = Result<Self::CreateData, RestError>> + Send;

    /// Validate the edit body against the located entity. Partial
    /// update semantics: only fields present in the body are touched.
    fn prepare_edit(
        &self,
        principal: Option<&Principal>,
        entity: &Self::Entity,
        body: &Value,
    ) -> impl Future<Output = Result<Self::EditData, RestError>> + Send;

    fn insert(&self, data: Self::CreateData)
    -> impl Future<Output = Result<(), RestError>> + Send;

    fn find(&self, id: Uuid) -> impl Future<Output = Result<Self::Entity, RestError>> + Send;

    fn apply_edit(
        &self,
        id: Uuid,
        data: Self::EditData,
    ) -> impl Future<Output = Result<(), RestError>> + Send;

    fn remove(&self, id: Uuid) -> impl Future<Output = Result<(), RestError>> + Send;

    fn search_page(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> impl Future<Output = Result<PaginatedResult<Self::Entity>, RestError>> + Send;

    /// Listing shape: no nested relations.
    fn short(&self, entity: &Self::Entity) -> Value;

    /// Single-read shape: short plus related entities' short shapes.
    /// Loads whatever relations it needs.
    fn full(&self, entity: &Self::Entity) -> impl Future<Output = Result<Value, RestError>> + Send;
}

/// List query parameters. `page` stays a string so malformed input
/// degrades to page 1 instead of failing extraction.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ListQuery {
    page: Option<String>,
    search: Option<String>,
}

impl ListQuery {
    /// 1-based page; anything unparseable or below 1 becomes 1.
    fn page(&self) -> u64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }
}

fn success(code: StatusCode) -> Response {
    (code, Json(json!({ "error": null }))).into_response()
}

/// The fixed CRUD algorithm, parameterized by an [`EntityHooks`]
/// implementation.
pub struct EntityController<H: EntityHooks> {
    hooks: H,
    auth: Arc<AuthConfig>,
}

impl<H: EntityHooks> EntityController<H> {
    pub fn new(hooks: H, auth: Arc<AuthConfig>) -> Self {
        Self { hooks, auth }
    }

    /// Authenticate according to the operation's policy: required
    /// operations must present a valid token; optional ones may run
    /// anonymously, but a presented-yet-invalid token still fails.
    fn principal_for(&self, op: Operation, headers: &HeaderMap) -> Result<Option<Principal>, RestError> {
        if self.hooks.policy().for_op(op).auth_required {
            Ok(Some(require_principal(headers, &self.auth)?))
        } else {
            optional_principal(headers, &self.auth)
        }
    }

    pub async fn create(&self, headers: &HeaderMap, body: Value) -> Result<Response, RestError> {
        let principal = self.principal_for(Operation::Create, headers)?;
        self.hooks.authorize(Operation::Create, principal.as_ref(), None)?;
        let data = self.hooks.prepare_create(principal.as_ref(), &body).await?;
        self.hooks.insert(data).await?;
        Ok(success(StatusCode::CREATED))
    }

    pub async fn delete(&self, headers: &HeaderMap, raw_id: &str) -> Result<Response, RestError> {
        let principal = self.principal_for(Operation::Delete, headers)?;
        let id = self.hooks.prepare_id(principal.as_ref(), raw_id)?;
        self.hooks.authorize(Operation::Delete, principal.as_ref(), Some(id))?;
        self.hooks.find(id).await?;
        self.hooks.remove(id).await?;
        Ok(success(StatusCode::OK))
    }

    pub async fn list(&self, headers: &HeaderMap, query: ListQuery) -> Result<Response, RestError> {
        let principal = self.principal_for(Operation::List, headers)?;
        self.hooks.authorize(Operation::List, principal.as_ref(), None)?;

        let page = query.page();
        let per_page = self.hooks.page_size();
        let result = self
            .hooks
            .search_page(
                query.search,
                Pagination {
                    offset: (page - 1) * per_page,
                    limit: per_page,
                },
            )
            .await?;

        let data: Vec<Value> = result.items.iter().map(|e| self.hooks.short(e)).collect();
        Ok((
            StatusCode::OK,
            Json(json!({
                "error": null,
                "data": data,
                "pages": result.total.div_ceil(per_page),
                "page": page,
            })),
        )
            .into_response())
    }

    pub async fn get(&self, headers: &HeaderMap, raw_id: &str) -> Result<Response, RestError> {
        let principal = self.principal_for(Operation::Get, headers)?;
        let id = self.hooks.prepare_id(principal.as_ref(), raw_id)?;
        self.hooks.authorize(Operation::Get, principal.as_ref(), Some(id))?;
        let entity = self.hooks.find(id).await?;
        let data = self.hooks.full(&entity).await?;
        Ok((
            StatusCode::OK,
            Json(json!({ "error": null, "data": data })),
        )
            .into_response())
    }

    pub async fn edit(
        &self,
        headers: &HeaderMap,
        raw_id: &str,
        body: Value,
    ) -> Result<Response, RestError> {
        let principal = self.principal_for(Operation::Edit, headers)?;
        let id = self.hooks.prepare_id(principal.as_ref(), raw_id)?;
        self.hooks.authorize(Operation::Edit, principal.as_ref(), Some(id))?;
        let entity = self.hooks.find(id).await?;
        let data = self
            .hooks
            .prepare_edit(principal.as_ref(), &entity, &body)
            .await?;
        self.hooks.apply_edit(id, data).await?;
        Ok(success(StatusCode::OK))
    }
}

/// Build the five REST routes for one entity.
pub fn crud_router<H: EntityHooks>(controller: EntityController<H>) -> Router {
    let state = Arc::new(controller);
    Router::new()
        .route(
            &format!("/{}", H::CODE),
            post(create_entity::<H>).get(list_entities::<H>),
        )
        .route(
            &format!("/{}/:id", H::CODE),
            get(get_entity::<H>)
                .put(edit_entity::<H>)
                .delete(delete_entity::<H>),
        )
        .with_state(state)
}

fn json_body(body: Option<Json<Value>>) -> Value {
    body.map(|Json(v)| v).unwrap_or(Value::Null)
}

async fn create_entity<H: EntityHooks>(
    State(controller): State<Arc<EntityController<H>>>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> Result<Response, RestError> {
    controller.create(&headers, json_body(body)).await
}

async fn list_entities<H: EntityHooks>(
    State(controller): State<Arc<EntityController<H>>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response, RestError> {
    controller.list(&headers, query).await
}

async fn get_entity<H: EntityHooks>(
    State(controller): State<Arc<EntityController<H>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, RestError> {
    controller.get(&headers, &id).await
}

async fn edit_entity<H: EntityHooks>(
    State(controller): State<Arc<EntityController<H>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Response, RestError> {
    controller.edit(&headers, &id, json_body(body)).await
}

async fn delete_entity<H: EntityHooks>(
    State(controller): State<Arc<EntityController<H>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, RestError> {
    controller.delete(&headers, &id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_page_defaults_to_one() {
        for raw in ["abc", "", "0", "-3", "1.5"] {
            let query = ListQuery {
                page: Some(raw.into()),
                search: None,
            };
            assert_eq!(query.page(), 1, "page {raw:?} should fall back to 1");
        }
    }

    #[test]
    fn valid_page_is_used() {
        let query = ListQuery {
            page: Some("7".into()),
            search: None,
        };
        assert_eq!(query.page(), 7);
    }

    #[test]
    fn missing_page_defaults_to_one() {
        assert_eq!(ListQuery::default().page(), 1);
    }
}
