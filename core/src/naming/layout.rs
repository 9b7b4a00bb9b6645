use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{DEFAULT_APP_DIR, DEFAULT_BUILD_DIR, DEFAULT_LAMBDA_DIR, Lambda, LambdaTrigger};

/// Where a service keeps the code needed to build and deploy its lambdas.
/// Every directory is derived from `root`; nothing here touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLayout {
    pub root: String,
    #[serde(default = "default_app")]
    pub app: String,
    #[serde(default = "default_lambdas")]
    pub lambdas: String,
    #[serde(default = "default_build")]
    pub build: String,
}

fn default_app() -> String {
    DEFAULT_APP_DIR.to_string()
}

fn default_lambdas() -> String {
    DEFAULT_LAMBDA_DIR.to_string()
}

fn default_build() -> String {
    DEFAULT_BUILD_DIR.to_string()
}

impl ServiceLayout {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            app: default_app(),
            lambdas: default_lambdas(),
            build: default_build(),
        }
    }

    pub fn root_dir(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }

    pub fn app_dir(&self) -> PathBuf {
        self.root_dir().join(&self.app)
    }

    pub fn lambdas_dir(&self) -> PathBuf {
        self.app_dir().join(&self.lambdas)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root_dir().join(&self.build)
    }

    pub fn trigger_dir(&self, trigger: LambdaTrigger) -> PathBuf {
        self.lambdas_dir().join(trigger.as_str())
    }

    /// `{root}/{app}/{lambdas}/{trigger}/{base_name}`
    pub fn code_dir(&self, lambda: &Lambda) -> PathBuf {
        self.lambdas_dir().join(lambda.code_dir())
    }
}

#[derive(Debug, Clone)]
pub struct Service {
    pub layout: ServiceLayout,
    pub name: String,
    pub env: String,
    pub features: BTreeMap<String, Lambda>,
}

impl Service {
    pub fn new(name: impl Into<String>, env: impl Into<String>, layout: ServiceLayout) -> Self {
        Self {
            layout,
            name: name.into(),
            env: env.into(),
            features: BTreeMap::new(),
        }
    }

    /// Registers a function under `name`, replacing any previous one.
    pub fn add_feature(&mut self, name: impl Into<String>, lambda: Lambda) -> Option<Lambda> {
        self.features.insert(name.into(), lambda)
    }

    pub fn feature(&self, name: &str) -> Option<&Lambda> {
        self.features.get(name)
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.features.keys().cloned().collect()
    }
}
