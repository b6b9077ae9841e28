use crate::errors::AppError;
use diesel::result::Error as DieselError;

/// 转换 Diesel 查询错误（统一映射为 AppError::DatabaseQuery）
/// 唯一约束冲突单独映射为业务冲突
pub fn map_diesel_error(e: DieselError) -> AppError {
    match e {
        DieselError::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, info) => {
            AppError::Conflict(format!(
                "Unique constraint violation: table={}, column={}, constraint={}, detail={}",
                info.table_name().unwrap_or("unknown"),
                info.column_name().unwrap_or("unknown"),
                info.constraint_name().unwrap_or("unknown"),
                info.message()
            ))
        }
        DieselError::DatabaseError(diesel::result::DatabaseErrorKind::ForeignKeyViolation, info) => {
            AppError::Conflict(format!("Foreign key violation: {}", info.message()))
        }
        _ => AppError::DatabaseQuery(e),
    }
}
