use crate::models::db::schema::verified_contracts;
use diesel::prelude::*;
use serde::Serialize;

/// 由外部验证接口写入，索引器只读取 abi 用于解码事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = verified_contracts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VerifiedContractRow {
    pub address: String,
    pub name: String,
    pub source: String,
    pub abi: String,
    pub compiler_version: String,
    pub optimization: i32,
    pub constructor_args: Option<String>,
    pub verified_at: i64,
}
