pub mod assembler;
pub mod declarations;
pub mod docs;
pub mod routes;

/// Escape `*/` sequences that would prematurely close JSDoc comment blocks.
pub fn escape_jsdoc(value: String) -> String {
    value.replace("*/", "*\\/")
}

/// Collapse free text onto one JSDoc-safe line.
pub fn jsdoc_line(text: &str) -> String {
    escape_jsdoc(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Template environment shared by every emitter.
pub fn environment() -> Result<minijinja::Environment<'static>, minijinja::Error> {
    let mut env = minijinja::Environment::new();
    env.set_trim_blocks(true);
    env.add_template("route.ts.j2", include_str!("../../templates/route.ts.j2"))?;
    env.add_template("module.ts.j2", include_str!("../../templates/module.ts.j2"))?;
    env.add_template("routes.test.ts.j2", include_str!("../../templates/routes.test.ts.j2"))?;
    env.add_template("docs.md.j2", include_str!("../../templates/docs.md.j2"))?;
    Ok(env)
}
