use crate::config::SyncConfig;
use crate::database::{DbService, TransactionExecutor};
use crate::errors::AppError;
use crate::infrastructure::parser::{BlockDecoder, DecodedBlock, EventDecoder};
use crate::infrastructure::provider::ChainProvider;
use crate::models::Token;
use crate::repositories::{
    BlockRepository, EventLogRepository, Repository, SyncStateRepository, TokenRepository,
    TokenTransferRepository, TransactionRepository,
};
use crate::services::{BalanceService, TokenService};
use crate::utils::thousands;
use crate::{log_error, log_info, log_warn};
use futures_util::FutureExt;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// 同步循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// 游标已追平链高
    Idle,
    CatchingUp,
    /// 出错后等待重试
    BackingOff,
}

/// 一个批次的执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// 没有新区块
    UpToDate,
    /// 游标已推进到 end
    Synced {
        start: u64,
        end: u64,
        /// 节点返回不存在而跳过的高度
        skipped: Vec<u64>,
    },
    /// 收到退出信号，批次未完成，游标不动
    Interrupted { last_committed: Option<u64> },
}

/// 等待重算余额的代币
#[derive(Debug, Default)]
struct BalanceBacklog {
    batches: u32,
    tokens: BTreeSet<String>,
}

pub struct BlockService {
    config: SyncConfig,
    db: Arc<DbService>,
    provider: Arc<dyn ChainProvider>,
    decoder: BlockDecoder,
    event_decoder: EventDecoder,
    token_service: TokenService,
    balance_service: BalanceService,
    cursor: SyncStateRepository,
    balance_backlog: Mutex<BalanceBacklog>,
}

impl BlockService {
    pub fn new(config: SyncConfig, db: Arc<DbService>, provider: Arc<dyn ChainProvider>) -> Self {
        Self {
            decoder: BlockDecoder::new(provider.clone()),
            event_decoder: EventDecoder::new(db.clone()),
            token_service: TokenService::new(
                provider.clone(),
                db.clone(),
                config.probe_created_contracts,
            ),
            balance_service: BalanceService::new(db.clone()),
            cursor: SyncStateRepository::new(),
            balance_backlog: Mutex::new(BalanceBacklog::default()),
            config,
            db,
            provider,
        }
    }

    pub async fn last_indexed_height(&self) -> Result<Option<u64>, AppError> {
        let cursor = self.cursor;
        self.db
            .with_conn(move |conn| async move { cursor.get_cursor(conn).await }.boxed())
            .await
    }

    /// 同步一个批次；任何错误都直接返回，游标保持不变
    pub async fn sync_batch(&self, shutdown: &watch::Receiver<bool>) -> Result<BatchOutcome, AppError> {
        let chain_height = self.provider.get_chain_height().await?;
        let start = match self.last_indexed_height().await? {
            Some(cursor) => cursor + 1,
            None => self.config.start_height,
        };
        if start > chain_height {
            return Ok(BatchOutcome::UpToDate);
        }
        let end = chain_height.min(start + self.config.batch_size.max(1) - 1);
        log_info!("开始同步区块: {} → {} (链高 {})", start, end, chain_height);

        let mut skipped = Vec::new();
        let mut touched_tokens = BTreeSet::new();
        let mut last_committed = None;

        for height in start..=end {
            if *shutdown.borrow() {
                log_warn!("收到退出信号，批次在高度 {} 前中断", height);
                return Ok(BatchOutcome::Interrupted { last_committed });
            }

            let Some(raw) = self.provider.get_block(height).await? else {
                log_warn!("节点不存在区块 {}，跳过", height);
                skipped.push(height);
                continue;
            };

            let mut decoded = self.decoder.decode(&raw).await?;
            self.event_decoder.annotate(&mut decoded.event_logs).await?;
            let new_tokens = self.token_service.resolve(&decoded).await?;

            touched_tokens.extend(decoded.token_candidates.iter().cloned());
            let token_addresses: Vec<String> = new_tokens.iter().map(|t| t.address.clone()).collect();
            self.persist_block(decoded, new_tokens).await?;
            self.token_service.mark_known(token_addresses.iter())?;
            last_committed = Some(height);
        }

        let cursor = self.cursor;
        self.db
            .execute_tx(move |conn| async move { cursor.set_cursor(conn, end).await }.boxed())
            .await?;

        if self.config.materialize_balances {
            let tokens = self.take_due_tokens(touched_tokens)?;
            if !tokens.is_empty() {
                if let Err(e) = self.balance_service.recompute_tokens(&tokens).await {
                    // 余额可以之后重跑，不影响游标
                    log_error!("重算余额失败，{} 个代币留到下次: {}", tokens.len(), e);
                    self.backlog()?.tokens.extend(tokens);
                }
            }
        }

        log_info!("区块同步完成，游标推进到 {}", end);
        Ok(BatchOutcome::Synced { start, end, skipped })
    }

    /// 累积本批次涉及的代币，满 balance_interval_batches 个批次后全部取出
    fn take_due_tokens(&self, touched: BTreeSet<String>) -> Result<Vec<String>, AppError> {
        let mut backlog = self.backlog()?;
        backlog.tokens.extend(touched);
        backlog.batches += 1;
        if backlog.batches < self.config.balance_interval_batches.max(1) {
            return Ok(Vec::new());
        }
        backlog.batches = 0;
        Ok(std::mem::take(&mut backlog.tokens).into_iter().collect())
    }

    fn backlog(&self) -> Result<std::sync::MutexGuard<'_, BalanceBacklog>, AppError> {
        self.balance_backlog
            .lock()
            .map_err(|_| AppError::Internal("余额待办锁已损坏".to_string()))
    }

    /// 区块、交易、日志、新代币、转账在同一个事务内写入
    pub async fn persist_block(&self, decoded: DecodedBlock, new_tokens: Vec<Token>) -> Result<(), AppError> {
        let height = decoded.height();
        let (tx_count, log_count, transfer_count, token_count) = (
            decoded.transactions.len(),
            decoded.event_logs.len(),
            decoded.transfers.len(),
            new_tokens.len(),
        );

        self.db
            .execute_tx(move |conn| {
                async move {
                    BlockRepository.save(conn, &decoded.block).await?;
                    TransactionRepository
                        .batch_save(conn, &decoded.transactions)
                        .await?;
                    EventLogRepository
                        .batch_save(conn, &decoded.event_logs)
                        .await?;
                    // 转账外键依赖代币，代币先写
                    TokenRepository.batch_save(conn, &new_tokens).await?;
                    TokenTransferRepository
                        .batch_save(conn, &decoded.transfers)
                        .await?;
                    Ok(())
                }
                .boxed()
            })
            .await?;

        log_info!(
            "区块 {} 入库: 交易 {} 笔, 日志 {} 条, 转账 {} 笔, 新代币 {} 个",
            thousands(height),
            tx_count,
            log_count,
            transfer_count,
            token_count
        );
        Ok(())
    }

    /// 主循环：空闲时轮询，出错时指数退避，收到退出信号后返回
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let poll = Duration::from_secs(self.config.poll_interval_secs.max(1));
        let base_backoff = Duration::from_secs(self.config.backoff_secs.max(1));
        let max_backoff = Duration::from_secs(self.config.max_backoff_secs.max(self.config.backoff_secs).max(1));
        let mut backoff = base_backoff;
        let mut state = SyncState::CatchingUp;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let wait = match self.sync_batch(&shutdown).await {
                Ok(BatchOutcome::Interrupted { .. }) => break,
                Ok(BatchOutcome::UpToDate) => {
                    backoff = base_backoff;
                    state = transition(state, SyncState::Idle);
                    poll
                }
                Ok(BatchOutcome::Synced { .. }) => {
                    backoff = base_backoff;
                    state = transition(state, SyncState::CatchingUp);
                    // 追块阶段不等待，立即进入下一批
                    Duration::ZERO
                }
                Err(e) => {
                    log_error!("同步批次失败，{:?} 后重试: {}", backoff, e);
                    state = transition(state, SyncState::BackingOff);
                    let wait = backoff;
                    backoff = (backoff * 2).min(max_backoff);
                    wait
                }
            };

            if wait.is_zero() {
                continue;
            }
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    // 发送端已释放，视为退出
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        log_info!("同步循环已退出");
    }
}

fn transition(from: SyncState, to: SyncState) -> SyncState {
    if from != to {
        log_info!("同步状态 {:?} → {:?}", from, to);
    }
    to
}
