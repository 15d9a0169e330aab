use playbook_discovery::{find_skill, list_skills, locate_skills_source, FrontmatterValue};
use std::fs;
use tempfile::tempdir;

#[test]
fn catalog_is_located_and_listed_with_frontmatter() {
    let tmp = tempdir().unwrap();
    let skills = tmp.path().join("playbook/skills");
    for (name, extra) in [
        ("skill-router", "tags: [routing]"),
        ("prd-planner", "tags: [planning, docs]"),
    ] {
        let dir = skills.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("SKILL.md"),
            format!("---\nname: {name}\ndescription: {name} skill\n{extra}\n---\n# {name}\n"),
        )
        .unwrap();
    }
    let work = tmp.path().join("playbook/src");
    fs::create_dir_all(&work).unwrap();
    let elsewhere = tmp.path().join("elsewhere");
    fs::create_dir_all(&elsewhere).unwrap();

    let root = locate_skills_source(&[elsewhere, work]).expect("catalog found");
    assert_eq!(root, skills);

    let listed = list_skills(&root).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].name, "prd-planner");

    let prd = find_skill(&root, "prd-planner").unwrap();
    assert_eq!(prd.description(), Some("prd-planner skill"));
    assert_eq!(
        prd.frontmatter.fields.get("tags"),
        Some(&FrontmatterValue::List(vec![
            "planning".to_string(),
            "docs".to_string()
        ]))
    );
}
