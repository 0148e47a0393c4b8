// tests/pipeline.rs

//! End-to-end recipe runs against recording fakes.

mod common;

use common::{
    CallLog, SAMPLE_RECIPE, kitchen_at, sample_recipe, test_kitchen, test_kitchen_with_transport,
};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use up_kitchen::recipe::kitchen::{BuildLock, CookStage, GitTransport};
use up_kitchen::recipe::layout::LOCK_FILE_NAME;
use up_kitchen::recipe::{OptionName, OptionValue, RequirementVariant, ToolchainValue};
use up_kitchen::{CookRequest, Error, Settings};

fn request(pairs: &[(&str, &str)], options: &[(&str, bool)]) -> CookRequest {
    let mut settings = Settings::default();
    for (key, value) in pairs {
        settings.set(key, value).unwrap();
    }
    let mut request = CookRequest::new("1.0.0", settings);
    for (name, value) in options {
        request = request.with_option(name, OptionValue::Bool(*value));
    }
    request
}

fn references(result: &[up_kitchen::recipe::Requirement]) -> Vec<String> {
    result.iter().map(|r| r.reference()).collect()
}

#[test]
fn test_linux_default_cook_reaches_packaged() {
    let tk = test_kitchen(false);
    let result = tk
        .kitchen
        .cook(&sample_recipe(), &request(&[], &[]))
        .unwrap();

    assert_eq!(result.stage, CookStage::Packaged);
    assert_eq!(
        references(&result.plan.requirements),
        vec!["protobuf/3.21.12", "spdlog/1.13.0"]
    );
    assert_eq!(
        *tk.calls.borrow(),
        vec![
            "fetch https://github.com/eclipse-uprotocol/up-cpp/archive/refs/tags/v1.0.0.tar.gz",
            "clone https://github.com/eclipse-uprotocol/up-core-api.git",
            "checkout v1.5.8",
            "configure",
            "build Release",
            "install",
        ]
    );

    // Install tree after hygiene
    let files: Vec<PathBuf> = result.artifacts.files.iter().cloned().collect();
    assert_eq!(
        files,
        vec![
            PathBuf::from("include/up-cpp/datamodel/builder/Uuid.h"),
            PathBuf::from("lib/libup-cpp.a"),
            PathBuf::from("licenses/LICENSE"),
        ]
    );
    assert!(result.removed.contains(&PathBuf::from("lib/cmake")));
    assert!(result.removed.contains(&PathBuf::from("lib/pkgconfig")));
    assert!(result.removed.contains(&PathBuf::from("share")));
    assert_eq!(result.package_dir, tk.workspace().join("install"));

    let info = &result.package_info;
    assert_eq!(info.libs, vec!["up-cpp"]);
    assert_eq!(info.system_libs, vec!["m", "pthread", "dl"]);
    assert_eq!(info.requires, vec!["protobuf::protobuf", "spdlog::spdlog"]);
    assert_eq!(info.property("cmake_target_name"), Some("up-cpp::up-cpp"));
}

#[test]
fn test_toolchain_seen_by_build_tool() {
    let tk = test_kitchen(false);
    tk.kitchen
        .cook(&sample_recipe(), &request(&[], &[]))
        .unwrap();

    let configured = tk.configured.borrow();
    let vars = configured.as_ref().unwrap();
    assert_eq!(
        vars.get("PROTO_PATH"),
        Some(&ToolchainValue::Str("up-core-api/uprotocol".to_string()))
    );
    assert_eq!(vars.get("BUILD_TESTING"), Some(&ToolchainValue::Bool(false)));
    assert_eq!(vars.get("BUILD_UNBUNDLED"), Some(&ToolchainValue::Bool(false)));
    assert_eq!(vars.get("BUILD_SHARED_LIBS"), Some(&ToolchainValue::Bool(false)));
    assert_eq!(
        vars.get("CMAKE_POSITION_INDEPENDENT_CODE"),
        Some(&ToolchainValue::Bool(false))
    );
    assert!(!vars.contains("USE_MSVC_RUNTIME_LIBRARY_DLL"));

    let script =
        fs::read_to_string(tk.workspace().join("build/Release/up_toolchain.cmake")).unwrap();
    assert!(script.contains("set(PROTO_PATH \"up-core-api/uprotocol\" CACHE STRING \"\" FORCE)"));
}

#[test]
fn test_build_testing_adds_test_framework() {
    let tk = test_kitchen(false);
    let result = tk
        .kitchen
        .cook(&sample_recipe(), &request(&[], &[("build_testing", true)]))
        .unwrap();

    assert_eq!(
        references(&result.plan.requirements),
        vec!["protobuf/3.21.12", "spdlog/1.13.0", "gtest/1.14.0"]
    );
    assert_eq!(
        result.plan.toolchain.get("BUILD_TESTING"),
        Some(&ToolchainValue::Bool(true))
    );
    // Test framework is a build-time requirement only
    assert_eq!(result.package_info.requires.len(), 2);
}

#[test]
fn test_msvc_shared_rejected_before_side_effects() {
    let tk = test_kitchen(false);
    let err = tk
        .kitchen
        .cook(
            &sample_recipe(),
            &request(
                &[("os", "Windows"), ("compiler", "msvc"), ("compiler.version", "193")],
                &[("shared", true)],
            ),
        )
        .unwrap_err();

    assert!(matches!(err, Error::ConfigurationError(_)));
    assert!(err.to_string().contains("can not be built as shared"));
    assert!(tk.calls.borrow().is_empty());
    assert!(!tk.workspace().exists());
}

#[test]
fn test_old_compiler_rejected_before_side_effects() {
    let tk = test_kitchen(false);
    let err = tk
        .kitchen
        .cook(&sample_recipe(), &request(&[("compiler.version", "9.4")], &[]))
        .unwrap_err();

    assert_eq!(err.kind(), "ConfigurationError");
    assert!(tk.calls.borrow().is_empty());
    assert!(!tk.workspace().exists());
}

#[test]
fn test_explicit_cppstd_below_minimum_rejected() {
    let tk = test_kitchen(false);
    let err = tk
        .kitchen
        .cook(&sample_recipe(), &request(&[("compiler.cppstd", "11")], &[]))
        .unwrap_err();
    assert!(matches!(err, Error::ConfigurationError(_)));
    assert!(tk.calls.borrow().is_empty());
}

#[test]
fn test_unknown_option_is_parse_error() {
    let tk = test_kitchen(false);
    let err = tk
        .kitchen
        .cook(&sample_recipe(), &request(&[], &[("with_docs", true)]))
        .unwrap_err();
    assert!(matches!(err, Error::ParseError(_)));
    assert!(tk.calls.borrow().is_empty());
}

#[test]
fn test_msvc_static_runtime_on_windows() {
    let tk = test_kitchen(false);
    let result = tk
        .kitchen
        .cook(
            &sample_recipe(),
            &request(
                &[
                    ("os", "Windows"),
                    ("compiler", "msvc"),
                    ("compiler.version", "193"),
                    ("compiler.runtime", "MT"),
                ],
                &[],
            ),
        )
        .unwrap();

    assert!(!result.plan.options.contains(OptionName::Fpic));
    let vars = &result.plan.toolchain;
    assert!(!vars.contains("CMAKE_POSITION_INDEPENDENT_CODE"));
    assert_eq!(
        vars.get("USE_MSVC_RUNTIME_LIBRARY_DLL"),
        Some(&ToolchainValue::Bool(false))
    );
    assert!(result.package_info.system_libs.is_empty());
}

#[test]
fn test_https_is_the_default_transport() {
    let tk = test_kitchen(false);
    let result = tk
        .kitchen
        .cook(&sample_recipe(), &request(&[], &[]))
        .unwrap();
    assert_eq!(result.plan.sources.transport.as_str(), "https");
    assert!(tk
        .calls
        .borrow()
        .contains(&"clone https://github.com/eclipse-uprotocol/up-core-api.git".to_string()));
    assert_eq!(GitTransport::from_env_value(None).as_str(), "https");
}

#[test]
fn test_ssh_transport_selects_ssh_url() {
    let tk = test_kitchen_with_transport(false, GitTransport::new("ssh"));
    tk.kitchen
        .source(&sample_recipe(), &request(&[], &[]))
        .unwrap();
    assert!(tk
        .calls
        .borrow()
        .contains(&"clone git@github.com:eclipse-uprotocol/up-core-api.git".to_string()));
}

#[test]
fn test_unknown_transport_fails_before_fetch() {
    let tk = test_kitchen_with_transport(false, GitTransport::new("svn"));
    let err = tk
        .kitchen
        .cook(&sample_recipe(), &request(&[], &[]))
        .unwrap_err();
    assert!(matches!(err, Error::ConfigurationError(_)));
    assert!(tk.calls.borrow().is_empty());
}

#[test]
fn test_unknown_version_fails_before_fetch() {
    let tk = test_kitchen(false);
    let mut req = request(&[], &[]);
    req.version = "0.0.1".to_string();
    let err = tk.kitchen.cook(&sample_recipe(), &req).unwrap_err();
    assert!(matches!(err, Error::ConfigurationError(_)));
    assert!(!tk.workspace().exists());
}

#[test]
fn test_stale_protocol_tree_is_replaced() {
    let tk = test_kitchen(true);
    let (_plan, sources) = tk
        .kitchen
        .source(&sample_recipe(), &request(&[], &[]))
        .unwrap();

    let proto = tk.workspace().join("src/up-core-api");
    assert_eq!(sources.auxiliary.path, proto);
    assert_eq!(sources.auxiliary.revision, "v1.5.8");
    assert!(!proto.join("uprotocol/stale.proto").exists());
    assert!(proto.join("uprotocol/uattributes.proto").is_file());
}

#[test]
fn test_cross_compiling_moves_protobuf_to_channel() {
    let tk = test_kitchen(false);
    let plan = tk
        .kitchen
        .prepare(
            &sample_recipe(),
            &request(&[], &[("build_cross_compiling", true)]),
        )
        .unwrap();

    let protobuf = &plan.requirements[0];
    assert_eq!(protobuf.version, "3.21.12");
    assert_eq!(
        protobuf.variant,
        RequirementVariant::CrossCompileChannel("cross/cross".to_string())
    );
    assert_eq!(protobuf.reference(), "protobuf/3.21.12@cross/cross");
}

#[test]
fn test_recook_same_workspace_starts_clean() {
    let tk = test_kitchen(false);
    let recipe = sample_recipe();
    tk.kitchen.cook(&recipe, &request(&[], &[])).unwrap();

    fs::write(tk.workspace().join("src/leftover.o"), "junk").unwrap();
    fs::write(tk.workspace().join("install/lib/libold.a"), "junk").unwrap();

    let result = tk.kitchen.cook(&recipe, &request(&[], &[])).unwrap();
    assert!(!tk.workspace().join("src/leftover.o").exists());
    assert_eq!(result.package_info.libs, vec!["up-cpp"]);
}

#[test]
fn test_concurrent_run_on_locked_workspace_fails() {
    let tk = test_kitchen(false);
    let _held = BuildLock::acquire(&tk.workspace().join(LOCK_FILE_NAME)).unwrap();

    let err = tk
        .kitchen
        .cook(&sample_recipe(), &request(&[], &[]))
        .unwrap_err();
    assert!(matches!(err, Error::ConfigurationError(_)));
    assert!(tk.calls.borrow().is_empty());
}

#[test]
fn test_requirement_projection_is_deterministic() {
    let tk = test_kitchen(false);
    let recipe = sample_recipe();
    let req = request(&[], &[("build_testing", true), ("build_cross_compiling", true)]);

    let first = tk.kitchen.prepare(&recipe, &req).unwrap();
    let second = tk.kitchen.prepare(&recipe, &req).unwrap();
    assert_eq!(first.requirements, second.requirements);
    assert_eq!(first.toolchain, second.toolchain);
}

#[test]
fn test_relative_recipe_and_workspace_paths() {
    // A scratch dir under the current directory, addressed by a relative path
    let scratch = tempfile::Builder::new()
        .prefix("relative-paths-")
        .tempdir_in(".")
        .unwrap();
    let rel = Path::new(scratch.path().file_name().unwrap());
    assert!(rel.is_relative());

    let recipe_dir = rel.join("recipes");
    fs::create_dir_all(recipe_dir.join("patches")).unwrap();
    fs::write(
        recipe_dir.join("up-cpp.toml"),
        format!(
            "{}\n[[versions.\"1.0.0\".patches]]\npatch_file = \"patches/0001-version.patch\"\n",
            SAMPLE_RECIPE
        ),
    )
    .unwrap();
    fs::write(
        recipe_dir.join("patches/0001-version.patch"),
        "--- a/CMakeLists.txt\n+++ b/CMakeLists.txt\n@@ -1 +1 @@\n-project(up-cpp)\n\
         +project(up-cpp VERSION 1.0.0)\n",
    )
    .unwrap();

    let recipe = up_kitchen::recipe::parse_recipe_file(&recipe_dir.join("up-cpp.toml")).unwrap();
    assert!(recipe.base_dir.is_absolute());

    let calls: CallLog = Rc::new(RefCell::new(Vec::new()));
    let kitchen = kitchen_at(&rel.join("ws"), &calls);

    if which::which("patch").is_err() {
        // Without a patch program only the path resolution can be checked
        let plan = kitchen.prepare(&recipe, &request(&[], &[])).unwrap();
        assert!(plan.layout.root.is_absolute());
        return;
    }

    let result = kitchen.cook(&recipe, &request(&[], &[])).unwrap();
    assert_eq!(result.stage, CookStage::Packaged);
    assert!(result.package_dir.is_absolute());
    assert_eq!(
        fs::read_to_string(result.plan.layout.source_dir.join("CMakeLists.txt")).unwrap(),
        "project(up-cpp VERSION 1.0.0)\n"
    );
    match result.plan.toolchain.get("CMAKE_INSTALL_PREFIX") {
        Some(ToolchainValue::Path(prefix)) => assert!(prefix.is_absolute()),
        other => panic!("unexpected install prefix: {other:?}"),
    }
}
