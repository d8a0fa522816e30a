//! Manifest building
//!
//! Turns a project directory into a [`Manifest`](crate::manifest::Manifest).
//! Unreadable roots and fatal per-file errors fail the build; everything
//! else is reported as a [`BuildWarning`] and the offending file is left out.

mod builder;
mod config;
mod report;
mod walker;

pub use builder::ManifestBuilder;
pub use config::{BuildConfig, ConfigFileEntry};
pub use report::{BuildReport, BuildWarning};
pub use walker::role_for;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::manifest::{FileRole, ItemRef, RemoteDependency};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, path: &str, content: &str) {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "package.json",
            r#"{"dependencies": {"zod": "^3.22.0"}, "devDependencies": {"vitest": "^1.6.0"}}"#,
        );
        write(root, "src/types/result.ts", "export type Result<T> = { ok: T };\n");
        write(
            root,
            "src/utils/math.ts",
            "import type { Result } from '../types/result.ts';\nimport { z } from 'zod';\nimport path from 'node:path';\n",
        );
        write(
            root,
            "src/utils/math.test.ts",
            "import { it } from 'vitest';\nimport { add } from './math';\n",
        );
        write(root, "src/utils/math.md", "# math\n");
        dir
    }

    fn config() -> BuildConfig {
        BuildConfig::default().with_dirs(["src"])
    }

    #[test]
    fn test_relative_import_becomes_local_dependency_and_template() {
        let dir = project();
        let report = ManifestBuilder::new(dir.path(), config()).build().unwrap();
        let math = report
            .manifest
            .find(&ItemRef::new("utils", "math"))
            .unwrap()
            .clone();

        assert_eq!(math.local_dependencies, vec![ItemRef::new("types", "result")]);
        assert_eq!(
            math.imports.get("../types/result.ts").map(String::as_str),
            Some("{{types/result}}.ts")
        );
        assert_eq!(
            math.dependencies,
            vec![RemoteDependency::new("zod", Some("^3.22.0".to_string()))]
        );
        assert_eq!(
            math.dev_dependencies,
            vec![RemoteDependency::new("vitest", Some("^1.6.0".to_string()))]
        );
        assert_eq!(math.directory, "src/utils");

        let roles: Vec<_> = math.files.iter().map(|f| (f.path.as_str(), f.role.clone())).collect();
        assert_eq!(
            roles,
            vec![("math.ts", FileRole::Primary), ("math.test.ts", FileRole::Test)]
        );
    }

    #[test]
    fn test_docs_need_opt_in() {
        let dir = project();
        let report = ManifestBuilder::new(dir.path(), config()).build().unwrap();
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, BuildWarning::DocsNotIncluded { .. })));

        let with_docs = BuildConfig {
            include_docs: true,
            ..config()
        };
        let report = ManifestBuilder::new(dir.path(), with_docs).build().unwrap();
        let math = report.manifest.find(&ItemRef::new("utils", "math")).unwrap();
        assert!(math.files.iter().any(|f| f.role == FileRole::Doc));
    }

    #[test]
    fn test_subdirectory_item_does_not_depend_on_itself() {
        let dir = project();
        write(
            dir.path(),
            "src/ui/button/button.svelte",
            "<script lang=\"ts\">\nimport { cn } from './utils';\nimport { add } from '../../utils/math';\n</script>\n",
        );
        write(dir.path(), "src/ui/button/utils.ts", "export const cn = () => '';\n");

        let report = ManifestBuilder::new(dir.path(), config()).build().unwrap();
        let button = report.manifest.find(&ItemRef::new("ui", "button")).unwrap();

        assert!(button.subdirectory);
        assert_eq!(button.local_dependencies, vec![ItemRef::new("utils", "math")]);
        assert!(!button.imports.contains_key("./utils"));
        assert_eq!(
            button.imports.get("../../utils/math").map(String::as_str),
            Some("{{utils/math}}")
        );
    }

    #[test]
    fn test_dotted_directory_item_keeps_its_name() {
        let dir = project();
        write(dir.path(), "src/ui/date.picker/index.ts", "export const pick = 1;\n");
        write(
            dir.path(),
            "src/utils/fmt.ts",
            "import { pick } from '../ui/date.picker/index.ts';\n",
        );

        let report = ManifestBuilder::new(dir.path(), config()).build().unwrap();
        assert!(report.manifest.find(&ItemRef::new("ui", "date.picker")).is_some());

        let fmt = report.manifest.find(&ItemRef::new("utils", "fmt")).unwrap();
        assert_eq!(fmt.local_dependencies, vec![ItemRef::new("ui", "date.picker")]);
        assert_eq!(
            fmt.imports.get("../ui/date.picker/index.ts").map(String::as_str),
            Some("{{ui/date.picker}}/index.ts")
        );
    }

    #[test]
    fn test_nested_directories_need_opt_in() {
        let dir = project();
        write(dir.path(), "src/ui/card/card.ts", "export {};\n");
        write(dir.path(), "src/ui/card/parts/header.ts", "export {};\n");

        let report = ManifestBuilder::new(dir.path(), config()).build().unwrap();
        let card = report.manifest.find(&ItemRef::new("ui", "card")).unwrap();
        assert_eq!(card.files.len(), 1);
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, BuildWarning::NestedDirectory { .. })));

        let nested = BuildConfig {
            allow_subdirectories: true,
            ..config()
        };
        let report = ManifestBuilder::new(dir.path(), nested).build().unwrap();
        let card = report.manifest.find(&ItemRef::new("ui", "card")).unwrap();
        let paths: Vec<_> = card.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["card.ts", "parts/header.ts"]);
    }

    #[test]
    fn test_unsupported_files_warn_unless_globbed() {
        let dir = project();
        write(dir.path(), "src/assets/logo.png", "png");

        let report = ManifestBuilder::new(dir.path(), config()).build().unwrap();
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, BuildWarning::UnsupportedFileType { .. })));
        assert!(report.manifest.category("assets").is_none());

        let globbed = BuildConfig {
            include_files: vec!["*.png".to_string()],
            ..config()
        };
        let report = ManifestBuilder::new(dir.path(), globbed).build().unwrap();
        assert!(report.manifest.contains(&ItemRef::new("assets", "logo")));
    }

    #[test]
    fn test_escaping_import_fails_only_that_file() {
        let dir = project();
        write(dir.path(), "scripts/gen.ts", "export {};\n");
        write(dir.path(), "src/utils/bad.ts", "import '../../scripts/gen';\n");

        let err = ManifestBuilder::new(dir.path(), config()).build().unwrap_err();
        match err {
            Error::Build { errors } => {
                assert_eq!(errors.len(), 1);
                assert!(matches!(errors[0], Error::LocalDependencyUnresolved { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_local_dependency_fails() {
        let dir = project();
        let excluded = BuildConfig {
            exclude_categories: vec!["types".to_string()],
            ..config()
        };
        let err = ManifestBuilder::new(dir.path(), excluded).build().unwrap_err();
        assert!(err.to_string().contains("types/result"));
    }

    #[test]
    fn test_prune_unlisted_unreferenced_items() {
        let dir = project();
        write(dir.path(), "src/internal/helper.ts", "export {};\n");
        let config = BuildConfig {
            do_not_list_categories: vec!["internal".to_string(), "types".to_string()],
            ..config()
        };

        let report = ManifestBuilder::new(dir.path(), config.clone()).build().unwrap();
        assert_eq!(report.pruned, vec![ItemRef::new("internal", "helper")]);
        let result = report.manifest.find(&ItemRef::new("types", "result")).unwrap();
        assert!(!result.listed);

        let keep_all = BuildConfig {
            prune_unused: false,
            ..config
        };
        let report = ManifestBuilder::new(dir.path(), keep_all).build().unwrap();
        assert!(report.manifest.contains(&ItemRef::new("internal", "helper")));
    }

    #[test]
    fn test_excluded_deps_are_not_recorded() {
        let dir = project();
        let config = BuildConfig {
            exclude_deps: vec!["zod".to_string()],
            ..config()
        };
        let report = ManifestBuilder::new(dir.path(), config).build().unwrap();
        let math = report.manifest.find(&ItemRef::new("utils", "math")).unwrap();
        assert!(math.dependencies.is_empty());
    }

    #[test]
    fn test_config_files_reject_local_imports() {
        let dir = project();
        write(dir.path(), "tailwind.config.ts", "import forms from '@tailwindcss/forms';\n");
        let config = BuildConfig {
            config_files: vec![ConfigFileEntry {
                name: "tailwind".to_string(),
                path: "tailwind.config.ts".to_string(),
                expected_path: "./tailwind.config.ts".to_string(),
                optional: true,
            }],
            ..config()
        };
        let report = ManifestBuilder::new(dir.path(), config.clone()).build().unwrap();
        let tailwind = &report.manifest.config_files[0];
        assert_eq!(tailwind.path, "tailwind.config.ts");
        assert_eq!(tailwind.dependencies[0].name, "@tailwindcss/forms");

        write(dir.path(), "tailwind.config.ts", "import { add } from './src/utils/math';\n");
        let err = ManifestBuilder::new(dir.path(), config).build().unwrap_err();
        assert!(err.to_string().contains("tailwind"));
    }

    #[test]
    fn test_unreadable_root_fails() {
        let dir = TempDir::new().unwrap();
        let err = ManifestBuilder::new(dir.path(), config()).build().unwrap_err();
        assert!(matches!(err, Error::ReadPath { .. }));
    }
}
