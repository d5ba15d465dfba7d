use crate::*;

#[test]
fn allocates_sequential_names() {
    let mut names = Names::new();
    assert_eq!(names.allocate("inv"), "inv_1");
    assert_eq!(names.allocate("inv"), "inv_2");
    assert_eq!(names.allocate("nand2"), "nand2_1");
    assert_eq!(names.len(), 3);
}

#[test]
fn skips_reserved_names() {
    let mut names = Names::new();
    names.reserve("inv_1").unwrap();
    names.reserve("inv_3").unwrap();
    assert_eq!(names.allocate("inv"), "inv_2");
    assert_eq!(names.allocate("inv"), "inv_4");
}

#[test]
fn names_are_case_insensitive() {
    let mut names = Names::new();
    assert_eq!(names.reserve("INV_1").unwrap(), "inv_1");
    assert!(names.contains("Inv_1"));
    assert_eq!(names.allocate("INV"), "inv_2");
}

#[test]
fn duplicate_reservation_fails() {
    let mut names = Names::new();
    names.reserve("r1").unwrap();
    assert_eq!(names.reserve("R1"), Err(DuplicateName("r1".into())));
}
