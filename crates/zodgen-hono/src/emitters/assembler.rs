use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use heck::ToKebabCase;
use minijinja::{Environment, context};
use zodgen_core::GeneratedFile;
use zodgen_core::config::{GenerateOptions, OutputLayout};
use zodgen_core::ir::Info;
use zodgen_core::naming::SCHEMA_SUFFIX;

use super::declarations::Declaration;
use super::routes::RouteDeclaration;
use crate::error::{AssembleError, GenerateError};

const ZOD_MODULE: &str = "@hono/zod-openapi";

/// Named imports grouped by module. Repeated names collapse.
#[derive(Debug, Default)]
struct ImportSet {
    modules: BTreeMap<String, BTreeSet<String>>,
}

impl ImportSet {
    fn add(&mut self, module: &str, name: impl Into<String>) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(name.into());
    }

    /// Package imports first, then relative ones.
    fn lines(&self) -> Vec<String> {
        let mut modules: Vec<(&String, &BTreeSet<String>)> = self.modules.iter().collect();
        modules.sort_by(|a, b| (a.0.starts_with('.'), a.0).cmp(&(b.0.starts_with('.'), b.0)));
        modules
            .into_iter()
            .map(|(module, names)| {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                format!("import {{ {} }} from '{module}';", names.join(", "))
            })
            .collect()
    }
}

/// Lay declarations and routes out into files.
pub fn assemble(
    env: &Environment<'_>,
    info: &Info,
    declarations: &[Declaration],
    routes: &[RouteDeclaration],
    options: &GenerateOptions,
) -> Result<Vec<GeneratedFile>, GenerateError> {
    let assembler = Assembler { env, info };
    match options.layout {
        OutputLayout::Single => assembler.single(declarations, routes, options),
        OutputLayout::Split => assembler.split(declarations, routes),
    }
}

/// Fail when two files would be written to the same path.
pub fn ensure_unique_paths(files: &[GeneratedFile]) -> Result<(), AssembleError> {
    let mut seen = HashSet::with_capacity(files.len());
    for file in files {
        if !seen.insert(file.path.as_str()) {
            return Err(AssembleError::OutputConflict {
                path: file.path.clone(),
            });
        }
    }
    Ok(())
}

/// File stem for a schema identifier: `FooBarSchema2` → `foo-bar2`.
pub fn module_stem(identifier: &str) -> String {
    let base = match identifier.rfind(SCHEMA_SUFFIX) {
        Some(i)
            if identifier[i + SCHEMA_SUFFIX.len()..]
                .chars()
                .all(|c| c.is_ascii_digit()) =>
        {
            format!("{}{}", &identifier[..i], &identifier[i + SCHEMA_SUFFIX.len()..])
        }
        _ => identifier.to_string(),
    };
    let stem = base.to_kebab_case();
    if stem.is_empty() { "schema".to_string() } else { stem }
}

struct Assembler<'a, 'env> {
    env: &'a Environment<'env>,
    info: &'a Info,
}

impl Assembler<'_, '_> {
    fn module(
        &self,
        path: String,
        imports: &ImportSet,
        blocks: Vec<String>,
    ) -> Result<GeneratedFile, GenerateError> {
        let tmpl = self.env.get_template("module.ts.j2")?;
        let rendered = tmpl.render(context! {
            title => &self.info.title,
            version => &self.info.version,
            imports => imports.lines(),
            blocks => blocks,
        })?;
        let mut content = rendered.trim_end().to_string();
        content.push('\n');
        Ok(GeneratedFile { path, content })
    }

    fn single(
        &self,
        declarations: &[Declaration],
        routes: &[RouteDeclaration],
        options: &GenerateOptions,
    ) -> Result<Vec<GeneratedFile>, GenerateError> {
        let mut imports = ImportSet::default();
        if !routes.is_empty() {
            imports.add(ZOD_MODULE, "createRoute");
        }
        imports.add(ZOD_MODULE, "z");

        let blocks = declarations
            .iter()
            .map(|d| d.render(options.export_schemas, options.export_types))
            .chain(routes.iter().map(|r| r.source.clone()))
            .collect();
        Ok(vec![self.module("index.ts".to_string(), &imports, blocks)?])
    }

    fn split(
        &self,
        declarations: &[Declaration],
        routes: &[RouteDeclaration],
    ) -> Result<Vec<GeneratedFile>, GenerateError> {
        // One file per group, named after its first member.
        let mut slots: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<&Declaration>)> = Vec::new();
        for decl in declarations {
            match slots.get(&decl.group) {
                Some(&slot) => groups[slot].1.push(decl),
                None => {
                    slots.insert(decl.group, groups.len());
                    groups.push((module_stem(&decl.identifier), vec![decl]));
                }
            }
        }
        let by_name: HashMap<&str, &Declaration> =
            declarations.iter().map(|d| (d.name.as_str(), d)).collect();
        let module_of = |decl: &Declaration| {
            slots
                .get(&decl.group)
                .map(|&slot| format!("./{}", groups[slot].0))
        };

        let mut files = Vec::with_capacity(groups.len() + 3);
        for (stem, members) in &groups {
            let mut imports = ImportSet::default();
            imports.add(ZOD_MODULE, "z");
            for decl in members {
                for dep in decl.depends_on.iter().filter_map(|n| by_name.get(n.as_str())) {
                    if dep.group == decl.group {
                        continue;
                    }
                    let Some(module) = module_of(*dep) else {
                        continue;
                    };
                    imports.add(&module, dep.identifier.as_str());
                    if !decl.lazy {
                        continue;
                    }
                    for alias in [&dep.type_identifier, &dep.input_type_identifier]
                        .into_iter()
                        .flatten()
                    {
                        imports.add(&module, format!("type {alias}"));
                    }
                }
            }
            let blocks = members.iter().map(|d| d.render(true, true)).collect();
            files.push(self.module(format!("schemas/{stem}.ts"), &imports, blocks)?);
        }

        let barrel = if groups.is_empty() {
            "export {};".to_string()
        } else {
            groups
                .iter()
                .map(|(stem, _)| format!("export * from './{stem}';"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        files.push(self.module(
            "schemas/index.ts".to_string(),
            &ImportSet::default(),
            vec![barrel],
        )?);

        let mut root = vec!["export * from './schemas';".to_string()];
        if !routes.is_empty() {
            let mut imports = ImportSet::default();
            imports.add(ZOD_MODULE, "createRoute");
            imports.add(ZOD_MODULE, "z");
            for dep in routes
                .iter()
                .flat_map(|r| r.depends_on.iter())
                .filter_map(|n| by_name.get(n.as_str()))
            {
                imports.add("../schemas", dep.identifier.as_str());
            }
            let blocks = routes.iter().map(|r| r.source.clone()).collect();
            files.push(self.module("routes/index.ts".to_string(), &imports, blocks)?);
            root.push("export * from './routes';".to_string());
        }
        files.push(self.module(
            "index.ts".to_string(),
            &ImportSet::default(),
            vec![root.join("\n")],
        )?);
        Ok(files)
    }
}
