use std::path::PathBuf;

use crate::compose::compose_grid;
use crate::foundation::error::{FigError, FigResult};
use crate::session::dispatch::Dispatcher;
use crate::session::report::{OutputArtifact, attribute_by_page};
use crate::spec::model::{FigureKind, FigureSpec, MultiSpec};

/// Render every child of a multi figure, then tile their pages into the parent's page.
///
/// Geometry is re-checked before the first child renders. Children keep their standalone pages
/// and result entries; only the composed page is returned for concatenation.
pub(crate) fn compose_multi(
    dispatcher: &mut Dispatcher<'_>,
    spec: &FigureSpec,
    multi: &MultiSpec,
    order: usize,
) -> FigResult<OutputArtifact> {
    multi
        .check_geometry()
        .map_err(|e| e.attributed_to(&spec.id))?;

    let mut children = Vec::with_capacity(multi.figures.len());
    for (index, child) in multi.figures.iter().enumerate() {
        let FigureKind::Single { type_name } = &child.kind else {
            return Err(FigError::config("nested 'multi' figures are not supported")
                .attributed_to(&child.id));
        };
        children.push(dispatcher.render_single(child, type_name, index)?);
    }

    let page = dispatcher.page_path(&spec.id);
    let panels: Vec<PathBuf> = children.iter().map(|c| c.page.clone()).collect();
    compose_grid(&panels, multi.row, multi.column, &page)
        .map_err(|e| attribute_by_page(e, &children).attributed_to(&spec.id))?;

    tracing::info!(
        id = %spec.id,
        panels = children.len(),
        rows = multi.row,
        columns = multi.column,
        page = %page.display(),
        "composed multi-panel figure"
    );
    Ok(OutputArtifact {
        id: spec.id.clone(),
        order,
        page,
        children,
    })
}
