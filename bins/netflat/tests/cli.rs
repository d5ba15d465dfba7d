use std::path::Path;

use clap::Parser as ClapParser;
use netflat::{Aspect, Component, ErrorKind, FlattenError, Library, Module};
use netflat_cli::{load_options, run, Args};

/// A design with one inverter per bit of a 2-bit bus, plus a recursive module.
fn design() -> Library {
    Library::from_iter([
        Module::with_schematic(
            "top",
            Aspect::from_iter([
                Component::named_wire("a[1:0]", (0, 0), (0, 10)),
                Component::instance("inv").with_terminal("in", (0, 10)),
                Component::ground((20, 0)),
            ]),
        ),
        Module::with_schematic("loop", Aspect::from_iter([Component::instance("loop")])),
    ])
}

fn write_design(dir: &Path) -> String {
    let path = dir.join("design.json");
    std::fs::write(&path, serde_json::to_string(&design()).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn merges_config_and_flags() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("netflat.toml");
    std::fs::write(&config, "leaves = [\"inv\"]\nglobals = [\"vdd\"]\n").unwrap();

    let args = Args::try_parse_from([
        "netflat",
        "design.json",
        "--config",
        config.to_str().unwrap(),
        "--leaf",
        "nand",
        "-g",
        "vss",
    ])
    .unwrap();
    let options = load_options(&args).unwrap();

    assert_eq!(
        options.leaves.iter().map(|leaf| leaf.as_str()).collect::<Vec<_>>(),
        vec!["inv", "nand"]
    );
    assert_eq!(
        options.globals.iter().map(|global| global.as_str()).collect::<Vec<_>>(),
        vec!["vdd", "vss"]
    );
    assert_eq!(args.top, "top");
}

#[test]
fn flattens_design_to_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let design = write_design(dir.path());
    let out = dir.path().join("out").join("netlist.json");

    let args = Args::try_parse_from([
        "netflat",
        design.as_str(),
        "--leaf",
        "inv",
        "--out",
        out.to_str().unwrap(),
    ])
    .unwrap();
    let extraction = run(args).unwrap();
    assert_eq!(extraction.netlist.len(), 3);

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written, serde_json::to_value(&extraction.netlist).unwrap());
    assert_eq!(written[0]["properties"]["name"], "inv_1[1]");
    assert_eq!(written[1]["connections"]["in"], "a[0]");
    assert_eq!(written[2]["type"], "ground");
}

#[test]
fn reports_flatten_errors() {
    let dir = tempfile::tempdir().unwrap();
    let design = write_design(dir.path());

    let args = Args::try_parse_from(["netflat", design.as_str(), "--top", "loop"]).unwrap();
    let err = run(args).unwrap_err();

    assert!(err.to_string().contains("loop"));
    let cause = err.downcast_ref::<FlattenError>().unwrap();
    assert_eq!(
        cause.kind(),
        &ErrorKind::RecursiveInclusion(vec!["loop".into(), "loop".into()])
    );
}

#[test]
fn missing_design_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let args = Args::try_parse_from(["netflat", missing.to_str().unwrap()]).unwrap();

    let err = run(args).unwrap_err();
    assert!(err.to_string().starts_with("Failed to read design file"));
}
