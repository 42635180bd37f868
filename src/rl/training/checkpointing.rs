//! Agent Parameter Store
//!
//! Path-addressed access to an agent's working directory: the exported
//! actor the runner loads and the resolved arguments the trainer consumes.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{EnsembleError, Result};
use crate::ml::DenseNetwork;
use crate::rl::config::AgentArgs;

const ACTOR_FILE: &str = "actor.json";
const ARGS_FILE: &str = "args.toml";

/// Checkpoint directory of a single agent
#[derive(Debug, Clone)]
pub struct Checkpointer {
    cwd: PathBuf,
}

impl Checkpointer {
    pub fn new<P: AsRef<Path>>(cwd: P) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
        }
    }

    /// Path of the exported actor network
    pub fn actor_path(&self) -> PathBuf {
        self.cwd.join(ACTOR_FILE)
    }

    /// Path of the resolved training arguments
    pub fn args_path(&self) -> PathBuf {
        self.cwd.join(ARGS_FILE)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.cwd.exists() {
            fs::create_dir_all(&self.cwd)?;
            debug!("Created agent directory {:?}", self.cwd);
        }
        Ok(())
    }

    /// Save an actor network
    pub fn save_actor(&self, network: &DenseNetwork) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.actor_path();
        network.save(&path)?;
        info!("Saved actor to {:?}", path);
        Ok(path)
    }

    /// Save training arguments as TOML
    pub fn save_args(&self, args: &AgentArgs) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.args_path();
        fs::write(&path, toml::to_string_pretty(args)?)?;
        info!("Saved training arguments to {:?}", path);
        Ok(path)
    }

    /// Load previously saved training arguments
    pub fn load_args(&self) -> Result<AgentArgs> {
        let content = fs::read_to_string(self.args_path())?;
        toml::from_str(&content).map_err(|e| EnsembleError::Configuration {
            agent: self.cwd.display().to_string(),
            reason: format!("invalid {ARGS_FILE}: {e}"),
        })
    }
}

/// Generate a file name with timestamp
pub fn timestamped_name(prefix: &str) -> String {
    let now = chrono::Utc::now();
    format!("{}_{}", prefix, now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{Activation, DenseLayer};
    use crate::rl::core::AgentKind;
    use crate::rl::environment::TradingEnvConfig;
    use std::env::temp_dir;

    #[test]
    fn test_paths() {
        let checkpointer = Checkpointer::new(temp_dir().join("ckpt_paths"));
        assert!(checkpointer.actor_path().ends_with("actor.json"));
        assert!(checkpointer.args_path().ends_with("args.toml"));
    }

    #[test]
    fn test_args_roundtrip() {
        let dir = temp_dir().join("drl_ensemble_args_roundtrip");
        let checkpointer = Checkpointer::new(&dir);
        let mut args = AgentArgs::new(AgentKind::Sac, TradingEnvConfig::default());
        args.cwd = dir.clone();
        args.break_step = Some(5000);

        checkpointer.save_args(&args).unwrap();
        let loaded = checkpointer.load_args().unwrap();

        assert_eq!(loaded.agent, AgentKind::Sac);
        assert_eq!(loaded.break_step, Some(5000));
        assert_eq!(loaded.net_dim, args.net_dim);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_actor_creates_dir() {
        let dir = temp_dir().join("drl_ensemble_actor_save");
        let _ = fs::remove_dir_all(&dir);
        let checkpointer = Checkpointer::new(&dir);
        assert!(!checkpointer.actor_path().exists());

        let network = DenseNetwork {
            input_dim: 2,
            layers: vec![DenseLayer::filled(2, 1, 0.1, Activation::Linear)],
            metadata: serde_json::json!({}),
        };
        let path = checkpointer.save_actor(&network).unwrap();

        assert_eq!(path, checkpointer.actor_path());
        assert_eq!(DenseNetwork::from_file(&path).unwrap().input_dim, 2);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_args_rejects_malformed_file() {
        let dir = temp_dir().join("drl_ensemble_args_malformed");
        fs::create_dir_all(&dir).unwrap();
        let checkpointer = Checkpointer::new(&dir);
        fs::write(checkpointer.args_path(), "agent = 3").unwrap();

        let err = checkpointer.load_args().unwrap_err();
        assert!(err.is_configuration());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_timestamped_name() {
        let name = timestamped_name("ensemble");
        assert!(name.starts_with("ensemble_"));
        assert!(name.len() > 10);
    }
}
