mod support;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use ferry_core::build::{BuildConfig, ManifestBuilder};
use ferry_core::classify::PathAliases;
use ferry_core::language::Languages;
use ferry_core::manifest::{ItemRef, MANIFEST_FILE};
use ferry_core::registry::RegistryResolver;
use ferry_core::resolve::{DependencyResolver, FetchedItem, ItemRequest, fetch_items, resolve_registries};
use ferry_core::rewrite::{InstallPaths, RewrittenFile, Rewriter};

use support::{FakeProvider, resolver, strings};

const RESULT_TS: &str = "export type Result<T> = { ok: true; value: T } | { ok: false };\n";
const MATH_TS: &str = "import type { Result } from '../types/result.ts';\nimport { z } from 'zod';\n\nexport const add = (a: number, b: number): Result<number> => ({ ok: true, value: a + b });\n";

/// Publish a small registry from disk and serve it as `fake/std`.
fn publish() -> (TempDir, FakeProvider) {
    publish_files(&[("types/result.ts", RESULT_TS), ("utils/math.ts", MATH_TS)])
}

/// Publish `files` (relative to `src/lib`) and serve them as `fake/std`.
fn publish_files(files: &[(&str, &str)]) -> (TempDir, FakeProvider) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("src/lib");
    for (path, content) in files {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    let config = BuildConfig::default().with_dirs(["src/lib"]);
    let report = ManifestBuilder::new(temp.path(), config).build().unwrap();

    let mut provider = FakeProvider::new().with_file(
        "fake/std",
        MANIFEST_FILE,
        &report.manifest.to_json_pretty().unwrap(),
    );
    for item in report.manifest.items() {
        for file in &item.files {
            let path = item.remote_path(file);
            let content = fs::read_to_string(temp.path().join(&path)).unwrap();
            provider = provider.with_file("fake/std", &path, &content);
        }
    }
    (temp, provider)
}

async fn fetch(resolver: &RegistryResolver, item: &str) -> Vec<FetchedItem> {
    let registries = resolve_registries(resolver, &strings(&["fake/std"]), &[])
        .await
        .unwrap();
    let request = ItemRequest::new(item.parse::<ItemRef>().unwrap());
    let items = DependencyResolver::new(&registries)
        .resolve(&[request])
        .unwrap();
    fetch_items(resolver, items).await.unwrap()
}

fn install_paths(cwd: &Path, entries: &[(&str, &str)]) -> InstallPaths {
    let paths: BTreeMap<String, String> = entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    InstallPaths::new(cwd, paths)
}

fn rewrite_all(rewriter: &Rewriter<'_>, fetched: &[FetchedItem]) -> Vec<RewrittenFile> {
    fetched
        .iter()
        .flat_map(|item| rewriter.rewrite(item).unwrap())
        .collect()
}

fn file<'a>(files: &'a [RewrittenFile], path: &Path) -> &'a RewrittenFile {
    files
        .iter()
        .find(|f| f.path == path)
        .unwrap_or_else(|| panic!("{} was not produced", path.display()))
}

#[tokio::test]
async fn published_manifest_records_templates_and_packages() {
    let (_registry, provider) = publish();
    let resolver = resolver(Arc::new(provider));
    let registries = resolve_registries(&resolver, &strings(&["fake/std"]), &[])
        .await
        .unwrap();

    let math = registries[0]
        .manifest
        .find(&ItemRef::new("utils", "math"))
        .unwrap();
    assert_eq!(math.directory, "src/lib/utils");
    assert_eq!(math.local_dependencies, vec![ItemRef::new("types", "result")]);
    assert_eq!(
        math.imports.get("../types/result.ts").map(String::as_str),
        Some("{{types/result}}.ts")
    );
    let packages: Vec<&str> = math.dependencies.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(packages, vec!["zod"]);
}

#[tokio::test]
async fn relative_imports_follow_the_consumer_layout() {
    let (_registry, provider) = publish();
    let resolver = resolver(Arc::new(provider));
    let fetched = fetch(&resolver, "utils/math").await;
    let ids: Vec<String> = fetched.iter().map(|f| f.resolved.id().to_string()).collect();
    assert_eq!(ids, vec!["types/result", "utils/math"]);

    let consumer = TempDir::new().unwrap();
    let paths = install_paths(
        consumer.path(),
        &[("types", "./src/types"), ("utils", "./lib/utils")],
    );
    let languages = Languages::default();
    let files = rewrite_all(&Rewriter::new(&paths, &languages), &fetched);

    let math = file(&files, &consumer.path().join("lib/utils/math.ts"));
    assert!(math.content.contains("from '../../src/types/result.ts'"));
    assert!(math.content.contains("from 'zod'"));

    let result = file(&files, &consumer.path().join("src/types/result.ts"));
    assert_eq!(result.content, RESULT_TS);
}

#[tokio::test]
async fn matching_layout_leaves_content_untouched() {
    let (_registry, provider) = publish();
    let resolver = resolver(Arc::new(provider));
    let fetched = fetch(&resolver, "utils/math").await;

    let consumer = TempDir::new().unwrap();
    let paths = install_paths(consumer.path(), &[("*", "./lib")]);
    let languages = Languages::default();
    let files = rewrite_all(&Rewriter::new(&paths, &languages), &fetched);

    let math = file(&files, &consumer.path().join("lib/utils/math.ts"));
    assert_eq!(math.content, MATH_TS);
}

#[tokio::test]
async fn alias_paths_produce_alias_specifiers() {
    let (_registry, provider) = publish();
    let resolver = resolver(Arc::new(provider));
    let fetched = fetch(&resolver, "utils/math").await;

    let consumer = TempDir::new().unwrap();
    let aliases = PathAliases::parse(
        consumer.path(),
        r#"{"compilerOptions": {"paths": {"$lib/*": ["./src/lib/*"]}}}"#,
    )
    .unwrap();
    let paths = install_paths(
        consumer.path(),
        &[("types", "$lib/types"), ("utils", "$lib/utils")],
    )
    .with_aliases(aliases);
    let languages = Languages::default();
    let files = rewrite_all(&Rewriter::new(&paths, &languages), &fetched);

    let math = file(&files, &consumer.path().join("src/lib/utils/math.ts"));
    assert!(math.content.contains("from '$lib/types/result.ts'"));
    file(&files, &consumer.path().join("src/lib/types/result.ts"));
}

#[tokio::test]
async fn project_aliases_are_read_from_tsconfig() {
    let (_registry, provider) = publish();
    let resolver = resolver(Arc::new(provider));
    let fetched = fetch(&resolver, "utils/math").await;

    let consumer = TempDir::new().unwrap();
    fs::write(
        consumer.path().join("tsconfig.json"),
        "{\n  // app aliases\n  \"compilerOptions\": { \"paths\": { \"@/*\": [\"./app/*\"], } }\n}\n",
    )
    .unwrap();
    let paths = install_paths(consumer.path(), &[("*", "@/shared")])
        .with_project_aliases()
        .unwrap();
    let languages = Languages::default();
    let files = rewrite_all(&Rewriter::new(&paths, &languages), &fetched);

    let math = file(&files, &consumer.path().join("app/shared/utils/math.ts"));
    assert!(math.content.contains("from '@/shared/types/result.ts'"));
}

#[tokio::test]
async fn unmapped_category_is_reported() {
    let (_registry, provider) = publish();
    let resolver = resolver(Arc::new(provider));
    let fetched = fetch(&resolver, "utils/math").await;

    let consumer = TempDir::new().unwrap();
    let paths = install_paths(consumer.path(), &[("utils", "./lib/utils")]);
    let languages = Languages::default();
    let rewriter = Rewriter::new(&paths, &languages);

    let err = rewriter.rewrite(&fetched[1]).unwrap_err();
    assert!(err.to_string().contains("'types'"));
}

#[tokio::test]
async fn rewriting_is_idempotent_and_watermarks_once() {
    let (_registry, provider) = publish();
    let resolver = resolver(Arc::new(provider));
    let fetched = fetch(&resolver, "utils/math").await;

    let consumer = TempDir::new().unwrap();
    let paths = install_paths(
        consumer.path(),
        &[("types", "./src/types"), ("utils", "./lib/utils")],
    );
    let languages = Languages::default();
    let rewriter = Rewriter::new(&paths, &languages).with_watermark(true);

    let math_item = &fetched[1];
    let math_file = &math_item.files[0];
    let once = rewriter
        .rewrite_file(&math_item.resolved, &math_file.file, &math_file.content)
        .unwrap();
    assert!(once.content.starts_with("// Installed by ferry from fake/std\n"));

    let twice = rewriter
        .rewrite_file(&math_item.resolved, &math_file.file, &once.content)
        .unwrap();
    assert_eq!(twice, once);
    assert_eq!(
        twice.path,
        PathBuf::from(consumer.path()).join("lib/utils/math.ts")
    );
}

#[tokio::test]
async fn categories_moved_onto_each_other_rewrite_once() {
    let (_registry, provider) = publish_files(&[
        ("a/m.ts", "import { b } from '../b/x.ts';\nimport { c } from '../c/x.ts';\n"),
        ("b/x.ts", "export const b = 1;\n"),
        ("c/x.ts", "export const c = 2;\n"),
    ]);
    let resolver = resolver(Arc::new(provider));
    let fetched = fetch(&resolver, "a/m").await;

    let consumer = TempDir::new().unwrap();
    let paths = install_paths(
        consumer.path(),
        &[("a", "./l/a"), ("b", "./l/c"), ("c", "./l/d")],
    );
    let languages = Languages::default();
    let rewriter = Rewriter::new(&paths, &languages);

    let item = fetched
        .iter()
        .find(|f| f.resolved.id() == ItemRef::new("a", "m"))
        .unwrap();
    let source = &item.files[0];
    let once = rewriter
        .rewrite_file(&item.resolved, &source.file, &source.content)
        .unwrap();
    assert_eq!(
        once.content,
        "import { b } from '../c/x.ts';\nimport { c } from '../d/x.ts';\n"
    );

    let twice = rewriter
        .rewrite_file(&item.resolved, &source.file, &once.content)
        .unwrap();
    assert_eq!(twice, once);
}
