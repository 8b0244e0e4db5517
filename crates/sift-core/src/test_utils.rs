use crate::{
    nevra::{Form, Nevra},
    package::Package,
    pool::PackagePool,
    reldep::Reldep,
};

/// Package from a `name-[epoch:]version-release.arch` string.
pub fn package(nevra: &str) -> Package {
    let parsed = Nevra::parse(nevra, &[Form::Nevra]).unwrap().pop().unwrap();
    Package {
        epoch: parsed.epoch.parse().unwrap_or(0),
        name: parsed.name,
        version: parsed.version,
        release: parsed.release,
        arch: parsed.arch,
        repo_id: "main".into(),
        location: format!("Packages/{nevra}.rpm"),
        ..Default::default()
    }
}

pub fn deps(specs: &[&str]) -> Vec<Reldep> {
    specs.iter().map(|s| Reldep::parse(s).unwrap()).collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn fixture_packages() -> Vec<Package> {
    let libs = |nevra: &str| Package {
        summary: "Library for pkg".into(),
        description: "Shared library used by the pkg tools".into(),
        source_rpm: Some("pkg-libs.src.rpm".into()),
        files: strings(&["/usr/lib64/libpkg.so.1"]),
        provides: deps(&["libpkg.so.1()(64bit)"]),
        ..package(nevra)
    };

    vec![
        Package {
            summary: "Sources of pkg".into(),
            description: "Source package".into(),
            ..package("pkg-1.2-3.src")
        },
        Package {
            summary: "Command line interface to pkg".into(),
            description: "Frontend for libpkg".into(),
            url: Some("https://example.com/pkg".into()),
            source_rpm: Some("pkg-1.2-3.src.rpm".into()),
            files: strings(&["/usr/bin/pkg", "/usr/share/man/man1/pkg.1.gz"]),
            requires: deps(&["pkg-libs >= 1:1.2", "libpkg.so.1()(64bit)"]),
            ..package("pkg-1.2-3.x86_64")
        },
        libs("pkg-libs-1.2-3.x86_64"),
        libs("pkg-libs-1:1.2-4.x86_64"),
        libs("pkg-libs-1:1.3-4.x86_64"),
        Package {
            summary: "Standalone tool".into(),
            description: "A daemon that watches packages".into(),
            url: Some("https://example.com/tool".into()),
            files: strings(&["/usr/bin/tool", "/usr/sbin/toold"]),
            provides: deps(&["pkg-tools = 2.0"]),
            obsoletes: deps(&["pkg-tools < 2.0"]),
            ..package("tool-2.0-1.x86_64")
        },
    ]
}

/// `pkg` source and binary, three `pkg-libs` versions and `tool`.
pub fn fixture_pool() -> PackagePool {
    PackagePool::new(fixture_packages())
}

/// The fixture pool plus `pkg-1-1.noarch` through `pkg-1-24.noarch` and two
/// identical `cmdline-1.2-3.noarch` packages.
pub fn versions_pool() -> PackagePool {
    let mut builder = PackagePool::builder();
    for pkg in fixture_packages() {
        builder.add_package(pkg);
    }
    for release in 1..=24 {
        builder.add_package(package(&format!("pkg-1-{release}.noarch")));
    }
    builder
        .add_package(package("cmdline-1.2-3.noarch"))
        .add_package(package("cmdline-1.2-3.noarch"));
    builder.build()
}

pub fn multiarch_pool() -> PackagePool {
    let mut builder = PackagePool::builder();
    for nevra in [
        "foo-1.0-1.x86_64",
        "foo-1.2-1.x86_64",
        "foo-1.2-2.noarch",
        "bar-4.5-1.noarch",
        "bar-4.0-1.x86_64",
        "bar-4.5-2.x86_64",
    ] {
        builder.add_package(package(nevra));
    }
    builder.build()
}
