//! Project configuration: locates `inkstone.yaml` by walking parent
//! directories (so the server can be started from anywhere inside a
//! project) and resolves the partition directories relative to the project
//! root.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

const PROJECT_FILE: &str = "inkstone.yaml";

#[derive(Deserialize)]
struct Project {
    /// Directory holding published post files, relative to the project root.
    #[serde(default = "Project::default_posts_directory")]
    posts_directory: PathBuf,

    /// Directory holding draft post files, relative to the project root.
    #[serde(default = "Project::default_drafts_directory")]
    drafts_directory: PathBuf,

    #[serde(default = "Project::default_listen")]
    listen: SocketAddr,
}

impl Project {
    fn default_posts_directory() -> PathBuf {
        PathBuf::from("content/posts")
    }

    fn default_drafts_directory() -> PathBuf {
        PathBuf::from("content/drafts")
    }

    fn default_listen() -> SocketAddr {
        "127.0.0.1:8314".parse().unwrap()
    }
}

pub struct Config {
    pub posts_directory: PathBuf,
    pub drafts_directory: PathBuf,
    pub listen: SocketAddr,
}

impl Config {
    /// Searches `dir` and its parents for the project file.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_str(&contents)
            .with_context(|| format!("Loading project file `{}`", path.display()))?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;
        Ok(Config {
            posts_directory: project_root.join(project.posts_directory),
            drafts_directory: project_root.join(project.drafts_directory),
            listen: project.listen,
        })
    }
}
