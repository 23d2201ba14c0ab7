use super::forms::{checkbox, email_address, normalize_email, not_blank, parse_date};
use super::{PaginationParams, ServiceResponse, build_page, escape_like, search_condition};
use crate::error::FieldErrors;
use crate::web::response::Pagination;

#[test]
fn pagination_params_apply_defaults_and_limits() {
    let params = PaginationParams::new(Some(0), Some(200), 20, 100);
    assert_eq!(params.page, 1, "page 应回退到最小值 1");
    assert_eq!(params.limit, 100, "limit 应被限制在最大值内");
    assert_eq!(params.offset(), 0, "第一页 offset 应为 0");
}

#[test]
fn fixed_page_size_ignores_client_limit() {
    let params = PaginationParams::fixed(Some(3), 10);
    assert_eq!(params.limit, 10);
    assert_eq!(params.offset(), 20);
}

#[test]
fn build_page_computes_pages_and_into_response() {
    let params = PaginationParams::new(Some(2), Some(15), 20, 50);
    let info = build_page(95, params);

    assert_eq!(info.pages, 7);
    assert!(info.has_next());
    assert!(info.has_previous());

    let response: Pagination = info.into();
    assert_eq!(response.page, 2);
    assert_eq!(response.limit, 15);
    assert_eq!(response.total, 95);
    assert_eq!(response.pages, 7);
}

#[test]
fn build_page_handles_empty_result() {
    let info = build_page(0, PaginationParams::fixed(None, 10));
    assert_eq!(info.pages, 0);
    assert!(!info.has_next());
}

#[test]
fn service_response_supports_message() {
    let response = ServiceResponse::with_message("payload", "ok");
    assert_eq!(response.data, "payload");
    assert_eq!(response.message.as_deref(), Some("ok"));
}

#[test]
fn escape_like_escapes_wildcards() {
    assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    assert_eq!(escape_like("plain"), "plain");
}

#[test]
fn blank_search_yields_no_condition() {
    let columns = [entity::notices::Column::Title];
    assert!(search_condition(&columns, None).is_none());
    assert!(search_condition(&columns, Some("   ")).is_none());
    assert!(search_condition(&columns, Some("exam")).is_some());
}

#[test]
fn custom_field_validators() {
    assert!(not_blank("  ").is_err());
    assert!(not_blank("x").is_ok());
    assert!(email_address("").is_ok());
    assert!(email_address("parent@example.com").is_ok());
    assert!(email_address("not-an-email").is_err());
}

#[test]
fn parse_date_records_errors() {
    let mut errors = FieldErrors::new();
    assert!(parse_date(&mut errors, "date_of_birth", "2015-04-01").is_some());
    assert!(errors.is_empty());

    assert!(parse_date(&mut errors, "date_of_birth", "01/04/2015").is_none());
    assert_eq!(errors.get("date_of_birth").unwrap(), ["Enter a valid date."]);
}

#[test]
fn checkbox_and_email_normalisation() {
    assert!(checkbox(Some("on")));
    assert!(checkbox(Some("true")));
    assert!(!checkbox(None));
    assert!(!checkbox(Some("off")));
    assert_eq!(normalize_email(" Ada@Example.COM "), "Ada@example.com");
}

#[test]
fn huge_page_number_is_clamped_without_overflow() {
    let params = PaginationParams::new(Some(u64::MAX), Some(20), 20, 100);
    assert!(params.offset() <= u64::MAX >> 1, "offset 必须落在有符号 64 位范围内");
    assert_eq!(params.offset(), (params.page - 1) * params.limit);

    let info = build_page(3, params);
    assert!(!info.has_next());
    assert!(info.has_previous());

    let single = PaginationParams::fixed(Some(u64::MAX), 1);
    assert_eq!(single.offset(), u64::MAX >> 1);
}
