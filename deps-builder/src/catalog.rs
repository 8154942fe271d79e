//! Third-party dependency catalog
//!
//! Every native library Freeminer links against, with its download location
//! and its idiosyncratic build recipe. The list is in link-dependency order:
//! zlib first, the audio codecs before anything linking them, gettext and
//! libiconv together, the NuGet packages last.
//!
//! All paths inside a recipe are relative to the `deps/` directory.

use crate::runner::Invocation;
use fm_core::{BuildMode, PatchOp, ToolchainProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a downloaded file is unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveKind {
    Zip,
    TarGz,
    TarBz2,
    /// Kept as downloaded (NuGet packages)
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSpec {
    pub url: String,
    /// Download target, relative to `deps/`
    pub file_name: String,
    pub kind: ArchiveKind,
}

impl ArchiveSpec {
    pub fn new(url: impl Into<String>, file_name: impl Into<String>, kind: ArchiveKind) -> Self {
        Self {
            url: url.into(),
            file_name: file_name.into(),
            kind,
        }
    }
}

/// One action of a build recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Patch { file: PathBuf, op: PatchOp },
    WriteFile { file: PathBuf, contents: String },
    Run(Invocation),
}

impl Step {
    pub fn patch(file: impl AsRef<Path>, search: impl Into<String>, replace: impl Into<String>) -> Self {
        Step::Patch {
            file: file.as_ref().to_path_buf(),
            op: PatchOp::new(search, replace),
        }
    }

    pub fn run(invocation: Invocation) -> Self {
        Step::Run(invocation)
    }
}

/// Dependency descriptor plus its build recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    /// Directory under `deps/` that marks the dependency as present
    pub dir_name: String,
    pub archives: Vec<ArchiveSpec>,
    pub steps: Vec<Step>,
}

impl Dependency {
    fn new(name: &str, version: &str, dir_name: String) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            dir_name,
            archives: Vec::new(),
            steps: Vec::new(),
        }
    }

    fn archive(mut self, url: String, file_name: impl Into<String>, kind: ArchiveKind) -> Self {
        self.archives.push(ArchiveSpec::new(url, file_name, kind));
        self
    }

    fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Number of external tool invocations in the recipe.
    pub fn invocation_count(&self) -> usize {
        self.steps.iter().filter(|s| matches!(s, Step::Run(_))).count()
    }
}

// ============================================================================
// Versions
// ============================================================================

/// Pinned versions for one toolchain profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versions {
    pub irrlicht: &'static str,
    pub curl: &'static str,
    pub openal: &'static str,
    pub libogg: &'static str,
    pub libvorbis: &'static str,
    pub zlib: &'static str,
    pub freetype: &'static str,
    pub luajit: &'static str,
    pub gettext: &'static str,
    pub libiconv: &'static str,
    /// msgpack-c commit; only the VS2013 set builds it
    pub msgpack: Option<&'static str>,
    pub leveldb: &'static str,
    pub crc32c: &'static str,
    pub snappy: &'static str,
}

impl Versions {
    pub fn for_profile(profile: ToolchainProfile) -> Self {
        match profile {
            ToolchainProfile::Vs2013 => Self {
                irrlicht: "1.8.1",
                curl: "7.34.0",
                openal: "1.15.1",
                libogg: "1.3.1",
                libvorbis: "1.3.3",
                zlib: "1.2.8",
                freetype: "2.5.2",
                luajit: "2.0.2",
                gettext: "0.13.1",
                libiconv: "1.9.1",
                msgpack: Some("8bc827ebf5b7f26ec2b98d181bc6c5f43a12fc73"),
                leveldb: "1.16.0.5",
                crc32c: "1.0.4",
                snappy: "1.1.1.7",
            },
            ToolchainProfile::Vs2015 => Self {
                irrlicht: "1.8.1",
                curl: "7.45.0",
                openal: "1.16.0",
                libogg: "1.3.2",
                libvorbis: "1.3.5",
                zlib: "1.2.8",
                freetype: "2.6.1",
                luajit: "2.0.4",
                gettext: "0.14.6",
                libiconv: "1.9.2",
                msgpack: None,
                leveldb: "1.16.0.5",
                crc32c: "1.0.4",
                snappy: "1.1.1.7",
            },
        }
    }

    pub fn irrlicht_dir(&self) -> String {
        format!("irrlicht-{}", self.irrlicht)
    }
    pub fn curl_dir(&self) -> String {
        format!("curl-{}", self.curl)
    }
    pub fn openal_dir(&self) -> String {
        format!("openal-soft-{}", self.openal)
    }
    pub fn libogg_dir(&self) -> String {
        format!("libogg-{}", self.libogg)
    }
    pub fn libvorbis_dir(&self) -> String {
        format!("libvorbis-{}", self.libvorbis)
    }
    pub fn zlib_dir(&self) -> String {
        format!("zlib-{}", self.zlib)
    }
    pub fn freetype_dir(&self) -> String {
        format!("freetype-{}", self.freetype)
    }
    pub fn luajit_dir(&self) -> String {
        format!("LuaJIT-{}", self.luajit)
    }
    pub fn gettext_dir(&self) -> String {
        format!("gettext-{}", self.gettext)
    }
    pub fn libiconv_dir(&self) -> String {
        format!("libiconv-{}", self.libiconv)
    }
    pub fn msgpack_dir(&self) -> Option<String> {
        self.msgpack.map(|rev| format!("msgpack-c-{rev}"))
    }

    /// FreeType encodes its version in the static library name (`freetype252MT.lib`).
    pub fn freetype_lib_tag(&self) -> String {
        self.freetype.replace('.', "")
    }
}

/// Directory under `deps/` holding the downloaded NuGet packages.
pub const NUGET_DIR: &str = "nuget";

// ============================================================================
// Catalog
// ============================================================================

/// Full dependency list for a profile, in build order.
pub fn catalog(profile: ToolchainProfile, mode: BuildMode, include_nuget: bool) -> Vec<Dependency> {
    let v = Versions::for_profile(profile);
    let toolset = profile == ToolchainProfile::Vs2015;

    let mut deps = vec![
        zlib(&v, mode, toolset),
        irrlicht(&v, mode, profile),
        curl(&v, mode),
        openal(&v, mode),
        libogg(&v, mode, toolset),
        libvorbis(&v, mode, toolset),
        freetype(&v, mode, profile),
        luajit(&v, mode),
        gettext(&v, mode),
    ];
    if let Some(msgpack) = msgpack(&v, mode) {
        deps.push(msgpack);
    }
    if include_nuget {
        deps.push(nuget_packages(&v));
    }
    deps
}

fn msbuild(target: &str, mode: BuildMode) -> Invocation {
    Invocation::new("MSBuild")
        .arg(target)
        .arg(format!("/p:Configuration={}", mode.as_str()))
}

fn devenv_upgrade(target: &str) -> Invocation {
    Invocation::new("devenv").args(["/upgrade", target])
}

const V140: &str = "<PlatformToolset>v140</PlatformToolset>";
const STATIC_LIB_TYPE: &str = "<ConfigurationType>StaticLibrary</ConfigurationType>";

/// Pin the VS2015 platform toolset on a project that does not declare one.
fn add_v140_toolset(file: PathBuf) -> Step {
    Step::patch(file, STATIC_LIB_TYPE, format!("{STATIC_LIB_TYPE}{V140}"))
}

fn replace_toolset(file: PathBuf, from: &str) -> Step {
    Step::patch(
        file,
        format!("<PlatformToolset>{from}</PlatformToolset>"),
        V140,
    )
}

/// Force the static C runtime in a project's `RuntimeLibrary` settings.
fn static_runtime(file: PathBuf) -> [Step; 2] {
    [
        Step::patch(
            file.clone(),
            "<RuntimeLibrary>MultiThreadedDLL</RuntimeLibrary>",
            "<RuntimeLibrary>MultiThreaded</RuntimeLibrary>",
        ),
        Step::patch(
            file,
            "<RuntimeLibrary>MultiThreadedDebugDLL</RuntimeLibrary>",
            "<RuntimeLibrary>MultiThreadedDebug</RuntimeLibrary>",
        ),
    ]
}

fn zlib(v: &Versions, mode: BuildMode, toolset: bool) -> Dependency {
    let dir = v.zlib_dir();
    let masm = Path::new(&dir).join("contrib").join("masmx86").join("bld_ml32.bat");
    let vc11 = Path::new(&dir).join("contrib").join("vstudio").join("vc11");

    let mut dep = Dependency::new("zlib", v.zlib, dir.clone())
        .archive(
            format!("http://prdownloads.sourceforge.net/libpng/{dir}.tar.gz?download"),
            format!("{dir}.tar.gz"),
            ArchiveKind::TarGz,
        )
        // SAFESEH for the x86 assembler objects
        .step(Step::patch(
            &masm,
            "ml /coff /Zi /c /Flmatch686.lst match686.asm",
            "ml /safeseh /coff /Zi /c /Flmatch686.lst match686.asm",
        ))
        .step(Step::patch(
            &masm,
            "ml /coff /Zi /c /Flinffas32.lst inffas32.asm",
            "ml /safeseh /coff /Zi /c /Flinffas32.lst inffas32.asm",
        ))
        .step(Step::patch(
            vc11.join("zlibvc.def"),
            format!("VERSION\t\t{}", v.zlib),
            "VERSION\t\t1.2",
        ))
        .step(Step::run(devenv_upgrade("zlibvc.sln").in_dir(&vc11)))
        .step(Step::patch(
            vc11.join("zlibstat.vcxproj"),
            "MultiThreadedDebugDLL",
            "MultiThreadedDebug",
        ));

    if toolset {
        for project in [
            "zlibstat.vcxproj",
            "zlibvc.vcxproj",
            "minizip.vcxproj",
            "testzlibdll.vcxproj",
            "testzlib.vcxproj",
            "miniunz.vcxproj",
        ] {
            dep = dep.step(replace_toolset(vc11.join(project), "v110"));
        }
    }

    dep.step(Step::run(
        msbuild("zlibvc.sln", mode).arg("/p:Platform=win32").in_dir(&vc11),
    ))
}

fn irrlicht(v: &Versions, mode: BuildMode, profile: ToolchainProfile) -> Dependency {
    let dir = v.irrlicht_dir();
    let src = Path::new(&dir).join("source").join("Irrlicht");
    let configuration = format!("/p:Configuration=Static lib - {}", mode.as_str());

    let dep = Dependency::new("Irrlicht", v.irrlicht, dir.clone())
        .archive(
            format!("http://downloads.sourceforge.net/irrlicht/{dir}.zip"),
            format!("{dir}.zip"),
            ArchiveKind::Zip,
        )
        // the bundled zlib clashes with ours
        .step(Step::patch(
            src.join("zlib").join("deflate.c"),
            "const char deflate_copyright[] =",
            "static const char deflate_copyright[] =",
        ));

    match profile {
        ToolchainProfile::Vs2013 => dep
            .step(Step::run(devenv_upgrade("Irrlicht11.0.sln").in_dir(&src)))
            .step(Step::patch(
                src.join("Irrlicht11.0.vcxproj"),
                "; _ITERATOR_DEBUG_LEVEL=0",
                "",
            ))
            .step(Step::run(
                Invocation::new("MSBuild")
                    .arg("Irrlicht11.0.sln")
                    .arg(configuration)
                    .in_dir(&src),
            )),
        ToolchainProfile::Vs2015 => dep
            .step(Step::run(devenv_upgrade("Irrlicht12.0.vcxproj").in_dir(&src)))
            .step(Step::run(
                Invocation::new("MSBuild")
                    .arg("Irrlicht12.0.vcxproj")
                    .arg(configuration)
                    .in_dir(&src),
            )),
    }
}

fn curl(v: &Versions, mode: BuildMode) -> Dependency {
    let dir = v.curl_dir();
    Dependency::new("curl", v.curl, dir.clone())
        .archive(
            format!("http://curl.haxx.se/download/{dir}.tar.gz"),
            format!("{dir}.tar.gz"),
            ArchiveKind::TarGz,
        )
        .step(Step::run(
            Invocation::new("nmake")
                .args(["/f", "Makefile.vc", "mode=static", "RTLIBCFG=static", "USE_IDN=no"])
                .arg(format!("DEBUG={}", mode.pick("no", "yes")))
                .in_dir(Path::new(&dir).join("winbuild")),
        ))
}

fn openal(v: &Versions, mode: BuildMode) -> Dependency {
    let dir = v.openal_dir();
    let build = Path::new(&dir).join("build");
    Dependency::new("OpenAL Soft", v.openal, dir.clone())
        .archive(
            format!("http://kcat.strangesoft.net/openal-releases/{dir}.tar.bz2"),
            format!("{dir}.tar.bz2"),
            ArchiveKind::TarBz2,
        )
        .step(Step::run(
            Invocation::new("cmake")
                .args(["..", "-DFORCE_STATIC_VCRT=1", "-DLIBTYPE=STATIC"])
                .in_dir(&build),
        ))
        .step(Step::run(msbuild("ALL_BUILD.vcxproj", mode).in_dir(&build)))
}

fn libogg(v: &Versions, mode: BuildMode, toolset: bool) -> Dependency {
    let dir = v.libogg_dir();
    let vs = Path::new(&dir).join("win32").join("VS2010");
    let mut dep = Dependency::new("libogg", v.libogg, dir.clone())
        .archive(
            format!("http://downloads.xiph.org/releases/ogg/{dir}.tar.gz"),
            format!("{dir}.tar.gz"),
            ArchiveKind::TarGz,
        )
        .step(Step::run(devenv_upgrade("libogg_static.vcxproj").in_dir(&vs)));
    if toolset {
        dep = dep.step(add_v140_toolset(vs.join("libogg_static.vcxproj")));
    }
    dep.step(Step::run(msbuild("libogg_static.vcxproj", mode).in_dir(&vs)))
}

fn libvorbis(v: &Versions, mode: BuildMode, toolset: bool) -> Dependency {
    let dir = v.libvorbis_dir();
    let vs = Path::new(&dir).join("win32").join("VS2010");
    let vorbisfile = vs.join("libvorbisfile").join("libvorbisfile_static.vcxproj");
    let vorbis = vs.join("libvorbis").join("libvorbis_static.vcxproj");

    let mut dep = Dependency::new("libvorbis", v.libvorbis, dir.clone())
        .archive(
            format!("http://downloads.xiph.org/releases/vorbis/{dir}.tar.gz"),
            format!("{dir}.tar.gz"),
            ArchiveKind::TarGz,
        )
        // point the property sheet at the libogg we actually built
        .step(Step::patch(
            vs.join("libogg.props"),
            "<LIBOGG_VERSION>1.2.0</LIBOGG_VERSION>",
            format!("<LIBOGG_VERSION>{}</LIBOGG_VERSION>", v.libogg),
        ))
        .steps(static_runtime(vorbisfile.clone()))
        .steps(static_runtime(vorbis.clone()));
    if toolset {
        dep = dep
            .step(add_v140_toolset(vorbis))
            .step(add_v140_toolset(vorbisfile));
    }
    dep.step(Step::run(devenv_upgrade("vorbis_static.sln").in_dir(&vs)))
        .step(Step::run(msbuild("vorbis_static.sln", mode).in_dir(&vs)))
}

fn freetype(v: &Versions, mode: BuildMode, profile: ToolchainProfile) -> Dependency {
    let dir = v.freetype_dir();
    let vc = Path::new(&dir).join("builds").join("windows").join("vc2010");
    let mirror = match profile {
        ToolchainProfile::Vs2013 => "http://download.savannah.gnu.org/releases/freetype",
        ToolchainProfile::Vs2015 => {
            "http://www.mirrorservice.org/sites/download.savannah.gnu.org/releases/freetype"
        }
    };

    let mut dep = Dependency::new("FreeType", v.freetype, dir.clone())
        .archive(
            format!("{mirror}/{dir}.tar.gz"),
            format!("{dir}.tar.gz"),
            ArchiveKind::TarGz,
        )
        .step(Step::run(devenv_upgrade("freetype.vcxproj").in_dir(&vc)));
    if profile == ToolchainProfile::Vs2015 {
        dep = dep.step(replace_toolset(vc.join("freetype.vcxproj"), "v100"));
    }
    dep.step(Step::run(
        Invocation::new("MSBuild")
            .arg("freetype.vcxproj")
            .arg(format!("/p:Configuration={} Multithreaded", mode.as_str()))
            .in_dir(&vc),
    ))
}

fn luajit(v: &Versions, mode: BuildMode) -> Dependency {
    let dir = v.luajit_dir();
    let src = Path::new(&dir).join("src");
    Dependency::new("LuaJIT", v.luajit, dir.clone())
        .archive(
            format!("http://luajit.org/download/{dir}.tar.gz"),
            format!("{dir}.tar.gz"),
            ArchiveKind::TarGz,
        )
        .step(Step::patch(
            src.join("msvcbuild.bat"),
            "/MD",
            mode.pick("/MT", "/MTd /Zi /Og"),
        ))
        .step(Step::run(
            Invocation::new("cmd")
                .args(["/C", "msvcbuild.bat", "static"])
                .in_dir(&src),
        ))
}

/// gettext and libiconv depend on each other, so they are fetched and built
/// as one unit: libiconv without NLS, gettext, then libiconv again.
fn gettext(v: &Versions, mode: BuildMode) -> Dependency {
    let gettext_dir = v.gettext_dir();
    let iconv_dir = v.libiconv_dir();
    let mflags = format!("MFLAGS={}", mode.pick("-MT", "-MTd"));
    let nmake = |dir: &str| {
        Invocation::new("nmake")
            .args(["-f", "Makefile.msvc"])
            .in_dir(dir)
    };

    Dependency::new("gettext", v.gettext, gettext_dir.clone())
        .archive(
            format!("http://ftp.gnu.org/gnu/gettext/{gettext_dir}.tar.gz"),
            format!("{gettext_dir}.tar.gz"),
            ArchiveKind::TarGz,
        )
        .archive(
            format!("http://ftp.gnu.org/gnu/libiconv/{iconv_dir}.tar.gz"),
            format!("{iconv_dir}.tar.gz"),
            ArchiveKind::TarGz,
        )
        // no `typedef enum { false = 0, true = 1 } _Bool;`
        .step(Step::patch(
            Path::new(&iconv_dir).join("windows").join("stdbool.h"),
            "# if !0",
            "# if 0",
        ))
        .step(Step::run(nmake(&iconv_dir).arg("NO_NLS=1").arg(&mflags)))
        .step(Step::run(
            nmake(&iconv_dir).arg("NO_NLS=1").arg(&mflags).arg("install"),
        ))
        .step(Step::run(
            nmake(&iconv_dir).arg("NO_NLS=1").arg(&mflags).arg("distclean"),
        ))
        .step(Step::patch(
            Path::new(&gettext_dir)
                .join("gettext-runtime")
                .join("intl")
                .join("localename.c"),
            "case SUBLANG_PUNJABI_PAKISTAN:",
            "//case SUBLANG_PUNJABI_PAKISTAN:",
        ))
        .step(Step::patch(
            Path::new(&gettext_dir)
                .join("gettext-runtime")
                .join("intl")
                .join("localename.c"),
            "case SUBLANG_ROMANIAN_MOLDOVA:",
            "//case SUBLANG_ROMANIAN_MOLDOVA:",
        ))
        .step(Step::patch(
            Path::new(&gettext_dir)
                .join("gettext-tools")
                .join("windows")
                .join("stdbool.h"),
            "# if !0",
            "# if 0",
        ))
        .step(Step::run(nmake(&gettext_dir).arg(&mflags)))
        .step(Step::run(nmake(&gettext_dir).arg(&mflags).arg("install")))
        // The NLS-enabled libiconv rebuild only gets through with a pass
        // under /Za in the middle; the first two passes stop early.
        .step(Step::run(nmake(&iconv_dir).arg(&mflags).tolerate_failure()))
        .step(Step::run(
            nmake(&iconv_dir)
                .arg(&mflags)
                .env("CL", "/Za")
                .tolerate_failure(),
        ))
        .step(Step::run(nmake(&iconv_dir).arg(&mflags).env("CL", "")))
        .step(Step::run(nmake(&iconv_dir).arg(&mflags).arg("install")))
}

const MSGPACK_VERSION_H: &str = r#"
#ifndef MSGPACK_VERSION_H__
#define MSGPACK_VERSION_H__
#ifdef __cplusplus
extern "C" {
#endif
const char* msgpack_version(void);
int msgpack_version_major(void);
int msgpack_version_minor(void);
#define MSGPACK_VERSION "0.5.8"
#define MSGPACK_VERSION_MAJOR 0
#define MSGPACK_VERSION_MINOR 5
#ifdef __cplusplus
}
#endif
#endif /* msgpack/version.h */
"#;

fn msgpack(v: &Versions, mode: BuildMode) -> Option<Dependency> {
    let rev = v.msgpack?;
    let dir = v.msgpack_dir()?;
    let root = Path::new(&dir);
    let type_hpp = root.join("src").join("msgpack").join("type.hpp");
    let vcproj = root.join("msgpack_vc2008.vcproj");

    Some(
        Dependency::new("msgpack-c", rev, dir.clone())
            .archive(
                format!("https://github.com/msgpack/msgpack-c/archive/{rev}.zip"),
                "msgpack.zip",
                ArchiveKind::Zip,
            )
            .step(Step::run(Invocation::new("bash").arg("preprocess").in_dir(root)))
            .step(Step::patch(
                &type_hpp,
                "#include \"type/tr1/unordered_map.hpp\"",
                "// #include \"type/tr1/unordered_map.hpp\"",
            ))
            .step(Step::patch(
                &type_hpp,
                "#include \"type/tr1/unordered_set.hpp\"",
                "// #include \"type/tr1/unordered_set.hpp\"",
            ))
            .step(Step::patch(&vcproj, "RuntimeLibrary=\"2\"", "RuntimeLibrary=\"0\""))
            .step(Step::patch(&vcproj, "RuntimeLibrary=\"3\"", "RuntimeLibrary=\"1\""))
            .step(Step::WriteFile {
                file: root.join("src").join("msgpack").join("version.h"),
                contents: MSGPACK_VERSION_H.to_string(),
            })
            // the VS2008 project does not link with the newer compiler as is
            .step(Step::run(
                Invocation::new("vcupgrade")
                    .arg("msgpack_vc2008.vcproj")
                    .in_dir(root),
            ))
            .step(Step::run(msbuild("msgpack_vc2008.vcxproj", mode).in_dir(root))),
    )
}

fn nuget_packages(v: &Versions) -> Dependency {
    let package = |name: &str, version: &str, file: &str| {
        ArchiveSpec::new(
            format!("http://www.nuget.org/api/v2/package/{name}/{version}"),
            format!("{NUGET_DIR}/{file}"),
            ArchiveKind::Raw,
        )
    };
    let mut dep = Dependency::new("NuGet packages", v.leveldb, NUGET_DIR.to_string());
    dep.archives = vec![
        package("LevelDB", v.leveldb, "leveldb.nupkg"),
        package("Crc32C", v.crc32c, "crc32c.nupkg"),
        package("Snappy", v.snappy, "snappy.nupkg"),
    ];
    dep
}
