//! 应用装配
//!
//! 打开数据库、装配各仓储与服务，并在启动时做一次连续学习天数校正。

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::catalog::CatalogService;
use crate::quiz::QuizEngine;
use crate::scratch::{MemoryScratch, ScratchStore};
use crate::services::cooldown::CooldownGate;
use crate::services::enrichment::EnrichmentProvider;
use crate::session::SessionController;
use crate::storage::progress::ProgressRepository;
use crate::storage::settings::SettingsRepository;
use crate::storage::stat::WordStatRepository;
use crate::storage::word::WordRepository;
use crate::storage::{DatabaseManager, StorageResult};
use crate::tracker::ProgressTracker;

/// 装配完成的应用
pub struct App {
    db: DatabaseManager,
    pub words: WordRepository,
    pub stats: WordStatRepository,
    pub progress: ProgressRepository,
    pub settings: SettingsRepository,
    pub tracker: ProgressTracker,
    pub session: SessionController,
    pub quiz: QuizEngine,
    pub catalog: CatalogService,
    pub enrichment: Arc<EnrichmentProvider>,
}

impl App {
    /// 打开磁盘数据库并装配
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let db = DatabaseManager::open(path)?;
        Self::assemble(db, Arc::new(MemoryScratch::new()))
    }

    /// 内存数据库装配 (测试用)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = DatabaseManager::open_in_memory()?;
        Self::assemble(db, Arc::new(MemoryScratch::new()))
    }

    fn assemble(db: DatabaseManager, scratch: Arc<dyn ScratchStore>) -> StorageResult<Self> {
        let conn = db.connection();
        let words = WordRepository::new(Arc::clone(&conn));
        let stats = WordStatRepository::new(Arc::clone(&conn));
        let progress = ProgressRepository::new(Arc::clone(&conn));
        let settings = SettingsRepository::new(conn);

        let tracker = ProgressTracker::new(stats.clone(), progress.clone(), settings.clone());
        // 启动时纠正缺勤后的连续天数
        tracker.correct_streak_on_load(Utc::now().date_naive())?;

        let session = SessionController::new(
            words.clone(),
            stats.clone(),
            settings.clone(),
            tracker.clone(),
            Arc::clone(&scratch),
        );
        let quiz = QuizEngine::new(words.clone(), stats.clone(), tracker.clone());
        let catalog = CatalogService::new(words.clone(), stats.clone(), tracker.clone());
        let enrichment = Arc::new(EnrichmentProvider::from_env(Arc::new(CooldownGate::new())));

        Ok(Self {
            db,
            words,
            stats,
            progress,
            settings,
            tracker,
            session,
            quiz,
            catalog,
            enrichment,
        })
    }

    pub fn database(&self) -> &DatabaseManager {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_seeds_builtin_words() {
        let app = App::open_in_memory().expect("open app");
        let words = app.words.get_all_words().expect("load words");
        assert!(!words.is_empty(), "builtin words should be seeded");
        assert!(words.iter().all(|w| !w.is_custom));
    }

    #[test]
    fn test_settings_default_row_present() {
        let app = App::open_in_memory().expect("open app");
        let settings = app.settings.get_settings().expect("load settings");
        assert_eq!(settings.daily_goal, 10);
        assert_eq!(settings.level, 1);
        assert_eq!(settings.xp, 0);
    }
}
