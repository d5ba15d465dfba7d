use crate::*;

#[test]
fn plain_names_are_lowercased() {
    assert_eq!(parse_signal("Clk").unwrap(), vec!["clk"]);
    assert_eq!(parse_signal(" a , B,c ").unwrap(), vec!["a", "b", "c"]);
    assert_eq!(parse_signal("/gates/inv").unwrap(), vec!["/gates/inv"]);
}

#[test]
fn empty_lists() {
    assert!(parse_signal("").unwrap().is_empty());
    assert!(parse_signal(" , ").unwrap().is_empty());
    assert_eq!(width("").unwrap(), 0);
}

#[test]
fn constant_index() {
    assert_eq!(parse_signal("A[3]").unwrap(), vec!["a[3]"]);
}

#[test]
fn iterated_ranges() {
    assert_eq!(
        parse_signal("d[3:0]").unwrap(),
        vec!["d[3]", "d[2]", "d[1]", "d[0]"]
    );
    assert_eq!(parse_signal("d[0:2]").unwrap(), vec!["d[0]", "d[1]", "d[2]"]);
    assert_eq!(
        parse_signal("d[0:6:2]").unwrap(),
        vec!["d[0]", "d[2]", "d[4]", "d[6]"]
    );
    // The step magnitude is taken from the list; its sign from the direction.
    assert_eq!(parse_signal("d[4:0:-3]").unwrap(), vec!["d[4]", "d[1]"]);
    assert_eq!(parse_signal("d[ 1 : 1 ]").unwrap(), vec!["d[1]"]);
}

#[test]
fn replication() {
    assert_eq!(parse_signal("a#3").unwrap(), vec!["a", "a", "a"]);
    assert_eq!(parse_signal("a #2").unwrap(), vec!["a", "a"]);
    assert!(parse_signal("a#0").unwrap().is_empty());
}

#[test]
fn suffixes_compose_left_to_right() {
    assert_eq!(
        parse_signal("a[1:0]#2").unwrap(),
        vec!["a[1]", "a[0]", "a[1]", "a[0]"]
    );
    assert_eq!(
        parse_signal("a#2[1:0]").unwrap(),
        vec!["a[1]", "a[1]", "a[0]", "a[0]"]
    );
    assert_eq!(
        parse_signal("m[1:0][0:1]").unwrap(),
        vec!["m[1][0]", "m[0][0]", "m[1][1]", "m[0][1]"]
    );
}

#[test]
fn numeric_constants() {
    assert_eq!(parse_signal("5'3").unwrap(), vec!["vdd", "gnd", "vdd"]);
    assert_eq!(parse_signal("0x3'4").unwrap(), vec!["gnd", "gnd", "vdd", "vdd"]);
    assert_eq!(parse_signal("0b10'2").unwrap(), vec!["vdd", "gnd"]);
    assert_eq!(parse_signal("017'4").unwrap(), vec!["vdd", "vdd", "vdd", "vdd"]);
    assert_eq!(parse_signal("-1'3").unwrap(), vec!["vdd", "vdd", "vdd"]);
    assert_eq!(parse_signal("0'2").unwrap(), vec!["gnd", "gnd"]);
}

#[test]
fn replicated_constants() {
    assert_eq!(parse_signal("1'1#3").unwrap(), vec!["vdd", "vdd", "vdd"]);
    assert_eq!(parse_signal("0'1 #2").unwrap(), vec!["gnd", "gnd"]);
    assert_eq!(
        parse_signal("2'2#2").unwrap(),
        vec!["vdd", "gnd", "vdd", "gnd"]
    );
    assert_eq!(width("en, 0'1#4").unwrap(), 5);
}

#[test]
fn mixed_list() {
    assert_eq!(
        parse_signal("sel, d[1:0], 1'1").unwrap(),
        vec!["sel", "d[1]", "d[0]", "vdd"]
    );
    assert_eq!(width("sel, d[7:0]").unwrap(), 9);
}

#[test]
fn invalid_signals() {
    let err = parse_signal("a, b[1:").unwrap_err();
    assert_eq!(err.item(), "b[1:");
    assert_eq!(err.text(), "a, b[1:");

    assert!(parse_signal("3a").is_err());
    assert!(parse_signal("a-b").is_err());
    assert!(parse_signal("5'0").is_err());
    assert!(parse_signal("a[x]").is_err());
}
