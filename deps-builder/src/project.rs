//! Main project generation and build
//!
//! Runs after every dependency is prepared:
//! 1. cmake generator with every dependency location passed as `-D` definitions
//! 2. fixes to the generated Visual Studio projects
//! 3. optional NuGet install of LevelDB and its `.props` imports
//! 4. MSBuild `ALL_BUILD`, `INSTALL`, `PACKAGE`
//!
//! All steps are relative to `project/`.

use crate::catalog::{Step, Versions, NUGET_DIR};
use crate::layout::Layout;
use crate::runner::Invocation;
use fm_core::{BuildMode, OrchestratorConfig, ToolchainProfile};
use std::path::{Path, PathBuf};

/// Install prefix of the gettext/libiconv `nmake install` targets.
pub const GETTEXT_PREFIX: &str = r"C:\usr";

fn path_str(path: PathBuf) -> String {
    path.display().to_string()
}

/// Every `-D` definition of the generator invocation, in order.
///
/// Paths are interpolated from the layout and catalog directory names;
/// nothing here checks that they exist.
pub fn cmake_definitions(
    profile: ToolchainProfile,
    mode: BuildMode,
    layout: &Layout,
) -> Vec<(String, String)> {
    let v = Versions::for_profile(profile);
    let dep = |dir: String, rel: &[&str]| {
        let mut path = layout.dep(&dir);
        for part in rel {
            path.push(part);
        }
        path_str(path)
    };
    let gettext = |rel: &[&str]| {
        let mut path = PathBuf::from(GETTEXT_PREFIX);
        for part in rel {
            path.push(part);
        }
        path.display().to_string()
    };
    let m = mode.as_str();

    let curl_build = match profile {
        ToolchainProfile::Vs2013 => format!("libcurl-vc-x86-{m}-static-ipv6-sspi-spnego-winssl"),
        ToolchainProfile::Vs2015 => format!("libcurl-vc-x86-{m}-static-ipv6-sspi-winssl"),
    };
    let curl_lib = mode.pick("libcurl_a.lib", "libcurl_a_debug.lib");
    let freetype_lib = format!(
        "freetype{}MT{}.lib",
        v.freetype_lib_tag(),
        mode.pick("", "_D")
    );
    let freetype_objs: &[&str] = match profile {
        ToolchainProfile::Vs2013 => &["objs", "win32", "vc2010"],
        ToolchainProfile::Vs2015 => &["objs", "vc2010", "win32"],
    };
    let openal_lib = dep(v.openal_dir(), &["build", m, "OpenAL32.lib"]);
    let openal_library = match profile {
        ToolchainProfile::Vs2013 => openal_lib,
        ToolchainProfile::Vs2015 => {
            format!("{};{}", openal_lib, dep(v.openal_dir(), &["build", m, "common.lib"]))
        }
    };
    let vorbis_out = ["win32", "VS2010", "Win32", m];

    let mut defs: Vec<(&str, String)> = vec![
        ("CMAKE_BUILD_TYPE", m.to_string()),
        ("RUN_IN_PLACE", "1".into()),
        ("CUSTOM_BINDIR", ".".into()),
        ("CMAKE_INSTALL_PREFIX", path_str(layout.install.clone())),
        ("STATIC_BUILD", "1".into()),
        ("IRRLICHT_SOURCE_DIR", dep(v.irrlicht_dir(), &[])),
        ("ENABLE_SOUND", "1".into()),
        ("OPENAL_INCLUDE_DIR", dep(v.openal_dir(), &["include", "AL"])),
        ("OPENAL_LIBRARY", openal_library),
        ("OGG_INCLUDE_DIR", dep(v.libogg_dir(), &["include"])),
        (
            "OGG_LIBRARY",
            dep(v.libogg_dir(), &[&vorbis_out[..], &["libogg_static.lib"][..]].concat()),
        ),
        ("VORBIS_INCLUDE_DIR", dep(v.libvorbis_dir(), &["include"])),
        (
            "VORBIS_LIBRARY",
            dep(v.libvorbis_dir(), &[&vorbis_out[..], &["libvorbis_static.lib"][..]].concat()),
        ),
        (
            "VORBISFILE_LIBRARY",
            dep(v.libvorbis_dir(), &[&vorbis_out[..], &["libvorbisfile_static.lib"][..]].concat()),
        ),
        ("ZLIB_INCLUDE_DIR", dep(v.zlib_dir(), &[])),
        (
            "ZLIB_LIBRARIES",
            dep(
                v.zlib_dir(),
                &["contrib", "vstudio", "vc11", "x86", &format!("ZlibStat{m}"), "zlibstat.lib"],
            ),
        ),
    ];
    if profile == ToolchainProfile::Vs2013 {
        defs.push(("ENABLE_FREETYPE", "1".into()));
    }
    defs.extend([
        ("FREETYPE_INCLUDE_DIR_freetype2", dep(v.freetype_dir(), &["include"])),
        ("FREETYPE_INCLUDE_DIR_ft2build", dep(v.freetype_dir(), &["include"])),
        (
            "FREETYPE_LIBRARY",
            dep(v.freetype_dir(), &[freetype_objs, &[freetype_lib.as_str()][..]].concat()),
        ),
        ("LUA_LIBRARY", dep(v.luajit_dir(), &["src", "lua51.lib"])),
        ("LUA_INCLUDE_DIR", dep(v.luajit_dir(), &["src"])),
        ("ENABLE_CURL", "1".into()),
        ("CURL_LIBRARY", dep(v.curl_dir(), &["builds", &curl_build, "lib", curl_lib])),
        ("CURL_INCLUDE_DIR", dep(v.curl_dir(), &["builds", &curl_build, "include"])),
        ("GETTEXT_INCLUDE_DIR", gettext(&["include"])),
        ("GETTEXT_LIBRARY", gettext(&["lib", "intl.lib"])),
        ("ICONV_LIBRARY", gettext(&["lib", "iconv.lib"])),
        ("GETTEXT_MSGFMT", gettext(&["bin", "msgfmt.exe"])),
        ("ENABLE_GETTEXT", "1".into()),
        ("ENABLE_LEVELDB", "1".into()),
    ]);
    match (profile, v.msgpack_dir()) {
        (ToolchainProfile::Vs2013, Some(msgpack)) => {
            let lib = format!("msgpack{}.lib", mode.pick("", "d"));
            defs.push(("MSGPACK_INCLUDE_DIR", dep(msgpack.clone(), &["include"])));
            defs.push(("MSGPACK_LIBRARY", dep(msgpack, &["lib", &lib])));
        }
        _ => {
            defs.push(("FORCE_LEVELDB", "1".into()));
            defs.push(("ENABLE_SQLITE3", "1".into()));
        }
    }

    defs.into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// `cmake <source> -DKEY=VALUE...`, run inside `project/`.
pub fn generator_invocation(profile: ToolchainProfile, mode: BuildMode, layout: &Layout) -> Invocation {
    Invocation::new("cmake")
        .arg(path_str(layout.source.clone()))
        .args(
            cmake_definitions(profile, mode, layout)
                .into_iter()
                .map(|(key, value)| format!("-D{key}={value}")),
        )
}

/// Fixes applied to the projects cmake generated.
pub fn generated_project_patches(profile: ToolchainProfile) -> Vec<Step> {
    let src = Path::new("src");
    let mut steps = vec![Step::patch(
        src.join("freeminer.vcxproj"),
        "</AdditionalLibraryDirectories>",
        r";$(DXSDK_DIR)\Lib\x86</AdditionalLibraryDirectories>",
    )];
    if profile == ToolchainProfile::Vs2013 {
        steps.push(Step::patch(
            src.join("sqlite").join("sqlite3.vcxproj"),
            "MultiThreadedDebugDLL",
            "MultiThreadedDebug",
        ));
    }
    // enet ignores STATIC_BUILD
    let enet = src.join("enet").join("enet.vcxproj");
    steps.push(Step::patch(
        &enet,
        "<RuntimeLibrary>MultiThreadedDLL</RuntimeLibrary>",
        "<RuntimeLibrary>MultiThreaded</RuntimeLibrary>",
    ));
    steps.push(Step::patch(
        &enet,
        "<RuntimeLibrary>MultiThreadedDebugDLL</RuntimeLibrary>",
        "<RuntimeLibrary>MultiThreadedDebug</RuntimeLibrary>",
    ));
    steps
}

/// Install LevelDB (with Snappy and Crc32C) from the downloaded packages
/// and import their property sheets into the game project.
pub fn nuget_steps(profile: ToolchainProfile, layout: &Layout, nuget_exe: &Path) -> Vec<Step> {
    let v = Versions::for_profile(profile);
    let exe = if nuget_exe.is_absolute() {
        nuget_exe.to_path_buf()
    } else {
        layout.root.join(nuget_exe)
    };
    let import = |package: &str, version: &str| {
        let props = format!(r"..\{package}.{version}\build\native\{package}.props");
        format!(r#"<Import Project="{props}" Condition="Exists('{props}')" />"#)
    };
    let marker = r#"<ItemGroup Label="ProjectConfigurations">"#;
    let imports = [
        import("LevelDB", v.leveldb),
        import("Snappy", v.snappy),
        import("Crc32C", v.crc32c),
        marker.to_string(),
    ]
    .join("\n  ");

    vec![
        Step::run(
            Invocation::new(path_str(exe))
                .args(["install", "LevelDB", "-source"])
                .arg(path_str(layout.dep(NUGET_DIR))),
        ),
        Step::patch(Path::new("src").join("freeminer.vcxproj"), marker, imports),
    ]
}

/// MSBuild `ALL_BUILD`, `INSTALL` and `PACKAGE`, in that order.
pub fn final_invocations(mode: BuildMode, parallel: bool) -> Vec<Invocation> {
    ["ALL_BUILD.vcxproj", "INSTALL.vcxproj", "PACKAGE.vcxproj"]
        .into_iter()
        .map(|target| {
            let inv = Invocation::new("MSBuild")
                .arg(target)
                .arg(format!("/p:Configuration={}", mode.as_str()));
            if parallel {
                inv.env("CL", "/MP")
            } else {
                inv
            }
        })
        .collect()
}

/// The whole main-project recipe.
pub fn project_steps(
    config: &OrchestratorConfig,
    mode: BuildMode,
    layout: &Layout,
) -> Vec<Step> {
    let mut steps = vec![Step::run(generator_invocation(config.profile, mode, layout))];
    steps.extend(generated_project_patches(config.profile));
    if config.fetch_nuget_packages {
        steps.extend(nuget_steps(config.profile, layout, &config.nuget_exe));
    }
    steps.extend(
        final_invocations(mode, config.parallel_compile)
            .into_iter()
            .map(Step::run),
    );
    steps
}
