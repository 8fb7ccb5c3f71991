//! HTTP endpoints for the transfer service.
//!
//! Every handler is a plain function over `&TransferService`; `routes`
//! binds them into a route table.

use std::future::{self, Ready};
use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::http::{HandlerError, RequestContext, Response, StatusResponse};
use crate::routing::{RouteError, RouteTable};
use crate::transfers::{
    Address, Amount, AmountParseError, CreateAccountRequest, TransferRequest, TransferService, WithdrawalId,
    WithdrawalRequest,
};

type HandlerResult = Result<Response, HandlerError>;

/// Build the route table for all transfer endpoints.
pub fn routes(service: Arc<TransferService>) -> Result<RouteTable, RouteError> {
    let mut routes = RouteTable::new();
    routes.post("/transfer", with_service(&service, transfer))?;
    routes.post("/withdrawal", with_service(&service, withdrawal))?;
    routes.get("/withdrawal/status/{withdrawalId}", with_service(&service, withdrawal_status))?;
    routes.get("/account/{accountId}", with_service(&service, get_account))?;
    routes.post("/account", with_service(&service, create_account))?;
    routes.get("/health", |_ctx: RequestContext| async {
        Response::json(StatusCode::OK, &json!({"status": "ok"})).map_err(HandlerError::from)
    })?;
    Ok(routes)
}

fn with_service<F>(
    service: &Arc<TransferService>,
    handler: F,
) -> impl Fn(RequestContext) -> Ready<HandlerResult> + Send + Sync + 'static
where
    F: Fn(&TransferService, RequestContext) -> HandlerResult + Send + Sync + 'static,
{
    let service = Arc::clone(service);
    move |ctx| future::ready(handler(&service, ctx))
}

fn parse_uuid(name: &str, value: &str) -> Result<Uuid, HandlerError> {
    value
        .parse()
        .map_err(|_| HandlerError::BadRequest(format!("Invalid {name}: {value}")))
}

fn parse_amount(value: &str) -> Result<Amount, HandlerError> {
    value
        .parse()
        .map_err(|e: AmountParseError| HandlerError::BadRequest(e.to_string()))
}

fn transfer(service: &TransferService, ctx: RequestContext) -> HandlerResult {
    let request = if ctx.has_body() {
        ctx.json::<TransferRequest>()?
    } else {
        TransferRequest {
            sender_account_id: parse_uuid(
                "senderAccountId",
                ctx.required_query("senderAccountId")?,
            )?,
            receiver_account_id: parse_uuid(
                "receiverAccountId",
                ctx.required_query("receiverAccountId")?,
            )?,
            amount: parse_amount(ctx.required_query("amount")?)?,
        }
    };

    service.transfer(
        request.sender_account_id,
        request.receiver_account_id,
        request.amount,
    )?;

    let body = StatusResponse::<()>::success("Money transferred successfully.", None);
    Ok(Response::json(StatusCode::OK, &body)?)
}

fn withdrawal(service: &TransferService, ctx: RequestContext) -> HandlerResult {
    let request = if ctx.has_body() {
        ctx.json::<WithdrawalRequest>()?
    } else {
        WithdrawalRequest {
            sender_account_id: parse_uuid(
                "senderAccountId",
                ctx.required_query("senderAccountId")?,
            )?,
            address: ctx.required_query("address")?.to_string(),
            amount: parse_amount(ctx.required_query("amount")?)?,
        }
    };
    if request.address.is_empty() {
        return Err(HandlerError::MissingParameter("address".to_string()));
    }

    let id = service.withdraw(
        request.sender_account_id,
        Address(request.address),
        request.amount,
    )?;

    let body = StatusResponse::success("Withdrawal request submitted.", Some(id));
    Ok(Response::json(StatusCode::OK, &body)?)
}

fn withdrawal_status(service: &TransferService, ctx: RequestContext) -> HandlerResult {
    let raw = ctx.path_param("withdrawalId").unwrap_or_default();
    let id = WithdrawalId(parse_uuid("withdrawalId", raw)?);
    let state = service.withdrawal_status(id)?;
    Ok(Response::json(StatusCode::OK, &state)?)
}

fn get_account(service: &TransferService, ctx: RequestContext) -> HandlerResult {
    let raw = ctx.path_param("accountId").unwrap_or_default();
    let account = service.account(parse_uuid("accountId", raw)?)?;
    Ok(Response::json(StatusCode::OK, &account)?)
}

fn create_account(service: &TransferService, ctx: RequestContext) -> HandlerResult {
    let request: CreateAccountRequest = ctx.json()?;
    if request.balance.is_negative() {
        return Err(HandlerError::BadRequest("Balance must not be negative".to_string()));
    }

    let id = request.id.unwrap_or_else(Uuid::new_v4);
    let account = service.create_account(id, request.name, request.balance);
    Ok(Response::json(StatusCode::CREATED, &account)?)
}
