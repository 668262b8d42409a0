//! Best-effort project context detection
//!
//! Sniffs a directory for language, framework, and project type markers to
//! build the `ProjectContext` used for layer selection and routing. All
//! fields are optional and detection is idempotent per path.

use crate::types::ProjectContext;
use std::path::{Path, PathBuf};

/// Detects a project context from a directory tree
pub struct ContextDetector {
    root: PathBuf,
}

impl ContextDetector {
    /// Create a detector rooted at `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Detect the project context
    pub fn detect(&self) -> ProjectContext {
        let language = self.detect_language();
        let framework = self.detect_framework();
        let project_type = derive_project_type(language.as_deref(), framework.as_deref());
        let project_id = self
            .root
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase());

        ProjectContext {
            language,
            framework,
            project_type,
            project_id,
            working_directory: Some(self.root.display().to_string()),
        }
    }

    fn detect_language(&self) -> Option<String> {
        let markers = [
            ("Cargo.toml", "rust"),
            ("go.mod", "go"),
            ("pom.xml", "java"),
            ("build.gradle", "java"),
            ("pyproject.toml", "python"),
            ("requirements.txt", "python"),
            ("setup.py", "python"),
            ("tsconfig.json", "typescript"),
            ("package.json", "javascript"),
        ];

        for (marker, language) in markers {
            if self.root.join(marker).exists() {
                // A package.json next to a tsconfig.json means TypeScript
                if language == "javascript" && self.root.join("tsconfig.json").exists() {
                    return Some("typescript".to_string());
                }
                return Some(language.to_string());
            }
        }

        self.detect_language_by_extension()
    }

    fn detect_language_by_extension(&self) -> Option<String> {
        let entries = std::fs::read_dir(&self.root).ok()?;

        let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let language = match ext {
                "rs" => "rust",
                "py" | "pyi" => "python",
                "ts" | "tsx" => "typescript",
                "js" | "jsx" => "javascript",
                "go" => "go",
                "java" | "kt" => "java",
                _ => continue,
            };
            *counts.entry(language).or_default() += 1;
        }

        counts
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(language, _)| language.to_string())
    }

    fn detect_framework(&self) -> Option<String> {
        if let Some(manifest) = self.read_root_file("Cargo.toml") {
            let checks = [
                ("axum", "axum"),
                ("actix-web", "actix"),
                ("rocket", "rocket"),
                ("tauri", "tauri"),
            ];
            for (marker, framework) in checks {
                if manifest.contains(marker) {
                    return Some(framework.to_string());
                }
            }
        }

        if let Some(manifest) = self.read_root_file("package.json") {
            let checks = [
                ("\"next\"", "next.js"),
                ("\"nuxt\"", "nuxt"),
                ("\"@remix-run/", "remix"),
                ("\"@angular/core\"", "angular"),
                ("\"vue\"", "vue"),
                ("\"vite\"", "vite"),
                ("\"react\"", "react"),
            ];
            for (marker, framework) in checks {
                if manifest.contains(marker) {
                    return Some(framework.to_string());
                }
            }
        }

        let python_manifest = self
            .read_root_file("pyproject.toml")
            .or_else(|| self.read_root_file("requirements.txt"));
        if let Some(manifest) = python_manifest {
            let manifest = manifest.to_lowercase();
            for framework in ["django", "fastapi", "flask"] {
                if manifest.contains(framework) {
                    return Some(framework.to_string());
                }
            }
        }

        None
    }

    fn read_root_file(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.root.join(name)).ok()
    }
}

fn derive_project_type(language: Option<&str>, framework: Option<&str>) -> Option<String> {
    let language = language?;

    let project_type = match language {
        "python" => match framework {
            Some("django") | Some("fastapi") | Some("flask") => "web_backend".to_string(),
            _ => "python_project".to_string(),
        },
        "typescript" | "javascript" => match framework {
            Some("next.js") | Some("react") | Some("remix") => "web_frontend".to_string(),
            Some("vite") => "vite_project".to_string(),
            _ => format!("{}_project", language),
        },
        other => format!("{}_project", other),
    };

    Some(project_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_detect_rust_with_axum() {
        let temp = TempDir::new().unwrap();
        write(&temp, "Cargo.toml", "[dependencies]\naxum = \"0.7\"\n");

        let context = ContextDetector::new(temp.path()).detect();
        assert_eq!(context.language.as_deref(), Some("rust"));
        assert_eq!(context.framework.as_deref(), Some("axum"));
        assert_eq!(context.project_type.as_deref(), Some("rust_project"));
        assert!(context.project_id.is_some());
    }

    #[test]
    fn test_detect_django_backend() {
        let temp = TempDir::new().unwrap();
        write(&temp, "pyproject.toml", "[project]\ndependencies = [\"Django>=4.0\"]\n");

        let context = ContextDetector::new(temp.path()).detect();
        assert_eq!(context.language.as_deref(), Some("python"));
        assert_eq!(context.framework.as_deref(), Some("django"));
        assert_eq!(context.project_type.as_deref(), Some("web_backend"));
    }

    #[test]
    fn test_detect_typescript_frontend() {
        let temp = TempDir::new().unwrap();
        write(&temp, "package.json", "{\"dependencies\": {\"next\": \"14.0.0\"}}");
        write(&temp, "tsconfig.json", "{}");

        let context = ContextDetector::new(temp.path()).detect();
        assert_eq!(context.language.as_deref(), Some("typescript"));
        assert_eq!(context.framework.as_deref(), Some("next.js"));
        assert_eq!(context.project_type.as_deref(), Some("web_frontend"));
    }

    #[test]
    fn test_detect_by_extension_fallback() {
        let temp = TempDir::new().unwrap();
        write(&temp, "main.go", "package main\n");
        write(&temp, "util.go", "package main\n");

        let context = ContextDetector::new(temp.path()).detect();
        assert_eq!(context.language.as_deref(), Some("go"));
        assert!(context.framework.is_none());
        assert_eq!(context.project_type.as_deref(), Some("go_project"));
    }

    #[test]
    fn test_detect_empty_directory() {
        let temp = TempDir::new().unwrap();

        let context = ContextDetector::new(temp.path()).detect();
        assert!(context.language.is_none());
        assert!(context.framework.is_none());
        assert!(context.project_type.is_none());
        assert!(context.project_id.is_some());
        assert!(context.working_directory.is_some());
    }

    #[test]
    fn test_detection_is_idempotent() {
        let temp = TempDir::new().unwrap();
        write(&temp, "Cargo.toml", "[package]\nname = \"demo\"\n");

        let detector = ContextDetector::new(temp.path());
        assert_eq!(detector.detect(), detector.detect());
    }
}
