//! The canonical pass pipeline, and the named intermediate stages `--emit-stage` can stop at.

use cfir::ir::Program;

/// A stage name accepted by `--emit-stage`, in pipeline order. `Final` is the default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Stage {
    Raw,
    Combined,
    UnreachableRemoved,
    Dominators,
    Ssa,
    CopyPropagated,
    OutOfSsa,
    Final,
}

/// Run the fixed pipeline (`combine_blocks`, `remove_unreachable`, `update_dominators`,
/// `update_post_dominators`, `convert_to_ssa_form`, `propagate_through_copies`,
/// `convert_from_ssa_form`, `remove_useless_copies`) over every function in `program`, stopping
/// early if `stop_at` names an earlier stage.
pub fn run(program: &mut Program, stop_at: Stage) -> anyhow::Result<()> {
    for f in program.functions_mut() {
        if stop_at == Stage::Raw {
            continue;
        }
        log::debug!("combine_blocks({})", f.name);
        cfir::passes::combine_blocks(f);
        if stop_at == Stage::Combined {
            continue;
        }

        log::debug!("remove_unreachable({})", f.name);
        cfir::passes::remove_unreachable(f);
        if stop_at == Stage::UnreachableRemoved {
            continue;
        }

        cfir::dominance::update_dominators(f);
        cfir::dominance::update_post_dominators(f);
        if stop_at == Stage::Dominators {
            continue;
        }

        log::debug!("convert_to_ssa_form({})", f.name);
        cfir::ssa::convert_to_ssa_form(f)
            .map_err(|e| anyhow::anyhow!("{}: {e}", f.name))?;
        if stop_at == Stage::Ssa {
            continue;
        }

        log::debug!("propagate_through_copies({})", f.name);
        cfir::passes::propagate_through_copies(f);
        if stop_at == Stage::CopyPropagated {
            continue;
        }

        log::debug!("convert_from_ssa_form({})", f.name);
        cfir::ssa::convert_from_ssa_form(f);
        if stop_at == Stage::OutOfSsa {
            continue;
        }

        log::debug!("remove_useless_copies({})", f.name);
        cfir::passes::remove_useless_copies(f);
    }
    Ok(())
}
