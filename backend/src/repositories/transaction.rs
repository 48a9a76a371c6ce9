//! Transaction helpers for the multi-row request and approval writes.

use crate::error::AppError;
use crate::types::RequestId;
use sqlx::postgres::PgTransaction;
use sqlx::PgPool;

pub async fn begin_transaction(db: &PgPool) -> Result<PgTransaction<'static>, AppError> {
    db.begin()
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))
}

pub async fn commit_transaction(tx: PgTransaction<'_>) -> Result<(), AppError> {
    tx.commit()
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))
}

/// Rolls back and hands `outcome` through, for conditional writes that matched no row.
pub async fn abandon<T>(tx: PgTransaction<'_>, outcome: T) -> Result<T, AppError> {
    tx.rollback()
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))?;
    Ok(outcome)
}

/// Takes the row lock on a request. Writers touching a request and its
/// approvals lock the request first.
pub async fn lock_request(tx: &mut PgTransaction<'_>, id: RequestId) -> Result<(), AppError> {
    sqlx::query("SELECT id FROM requests WHERE id = $1 FOR UPDATE")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
