//! 大小写不敏感的多字段子串搜索

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{ColumnTrait, Condition};

/// 转义 LIKE 通配符
#[must_use]
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// 构造 `lower(col) LIKE %term%` 的 OR 条件；搜索词为空时返回 `None`
///
/// 搜索词只折叠 ASCII 大小写，与 SQLite `lower()` 一致，非 ASCII 字符按原样匹配。
#[must_use]
pub fn search_condition<C: ColumnTrait>(columns: &[C], term: Option<&str>) -> Option<Condition> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    let pattern = format!("%{}%", escape_like(&term.to_ascii_lowercase()));

    let condition = columns.iter().fold(Condition::any(), |condition, column| {
        condition.add(
            Expr::expr(Func::lower(Expr::col((column.entity_name(), *column))))
                .like(LikeExpr::new(pattern.clone()).escape('\\')),
        )
    });
    Some(condition)
}
