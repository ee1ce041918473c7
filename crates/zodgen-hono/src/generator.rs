use log::debug;
use zodgen_core::config::{GenerateOptions, OutputLayout};
use zodgen_core::graph::{DependencyGraph, order_declarations};
use zodgen_core::ir::Document;
use zodgen_core::naming::NameRegistry;
use zodgen_core::{CodeGenerator, GenerationOutput};

use crate::emitters::{self, assembler, declarations, docs, routes, tests};
use crate::error::GenerateError;
use crate::expression::ExpressionGenerator;
use crate::symbols::Symbols;

/// Identifiers imported into every generated module.
const RESERVED: [&str; 2] = ["z", "createRoute"];

/// Zod schemas and Hono `createRoute` definitions.
pub struct HonoGenerator;

impl CodeGenerator for HonoGenerator {
    type Options = GenerateOptions;
    type Error = GenerateError;

    fn generate(
        &self,
        doc: &Document,
        options: &GenerateOptions,
    ) -> Result<GenerationOutput, GenerateError> {
        let env = emitters::environment()?;

        let graph = DependencyGraph::build(&doc.schemas);
        let order = order_declarations(&graph);
        for cycle in graph.cycles() {
            debug!("lazy binding for cycle: {}", cycle.join(" -> "));
        }

        let mut registry = NameRegistry::new();
        for identifier in RESERVED {
            registry.reserve(identifier);
        }
        let symbols = Symbols::assign(&doc.schemas, &order, options.schema_casing, &mut registry);
        let mut generator = ExpressionGenerator::new(&doc.schemas, &symbols);

        let declarations =
            declarations::emit_declarations(&doc.schemas, &order, &symbols, &mut generator);
        debug!("emitted {} schema declarations", declarations.len());
        let routes = routes::emit_routes(
            &env,
            doc,
            options.base_path.as_deref(),
            &mut registry,
            &mut generator,
        )?;
        debug!("emitted {} routes", routes.len());

        let mut files = assembler::assemble(&env, &doc.info, &declarations, &routes, options)?;
        if options.docs {
            files.push(docs::emit_docs(&env, doc, &declarations, &routes)?);
        }
        if options.tests {
            let module = match options.layout {
                OutputLayout::Single => "./index",
                OutputLayout::Split => "./routes",
            };
            files.extend(tests::emit_route_tests(&env, &routes, module)?);
        }
        assembler::ensure_unique_paths(&files)?;

        let mut diagnostics = registry.into_diagnostics();
        diagnostics.extend(generator.into_diagnostics());
        for diagnostic in &diagnostics {
            diagnostic.log();
        }

        Ok(GenerationOutput { files, diagnostics })
    }
}
