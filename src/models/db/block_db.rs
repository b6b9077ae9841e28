use crate::errors::AppError;
use crate::models::db::schema::blocks;
use crate::models::domain::Block;
use crate::utils::to_i64;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = blocks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct BlockRow {
    pub height: i64,
    pub hash: String,
    pub parent_hash: Option<String>,
    pub timestamp: i64,
    pub miner: Option<String>,
    pub difficulty: f64,
    pub tx_count: i32,
    pub size: i64,
    pub nonce: i64,
    pub is_pos: i32,
    pub reward: String,
}

impl TryFrom<&Block> for BlockRow {
    type Error = AppError;

    fn try_from(block: &Block) -> Result<Self, Self::Error> {
        Ok(Self {
            height: to_i64(block.height, "block.height")?,
            hash: block.hash.clone(),
            parent_hash: block.parent_hash.clone(),
            timestamp: block.timestamp,
            miner: block.miner.clone(),
            difficulty: block.difficulty,
            tx_count: i32::try_from(block.tx_count)?,
            size: to_i64(block.size, "block.size")?,
            // nonce 是 u32 范围，超出时按位保存
            nonce: block.nonce as i64,
            is_pos: i32::from(block.is_pos),
            reward: block.reward.clone(),
        })
    }
}
