use super::*;

impl GridDataService {
    pub(super) async fn resolve_view(
        &self,
        actor: &UserIdentity,
        grid: &GridDefinition,
        request: &GridRequest,
    ) -> AppResult<ResolvedView> {
        let grid_key = grid.grid_key.as_str();
        let preference = self.views.get_user_preference(actor, grid_key).await?;

        if !grid.uses_system_views() {
            let current = if request.ignore_default {
                None
            } else {
                let view_id = request.view_id.as_ref().and_then(ViewId::as_saved);
                self.views
                    .get_effective_view(actor, grid_key, view_id)
                    .await?
            };
            let preferred = match preference {
                Some(PreferenceTarget::View(view_id)) => Some(ViewId::Saved(view_id)),
                _ => None,
            };

            return Ok(ResolvedView {
                current,
                system: None,
                preferred,
            });
        }

        let preferred = preference.map(|target| target.view_id());
        let requested = request.view_id.clone().or_else(|| preferred.clone());
        let mut resolved = ResolvedView {
            preferred,
            ..ResolvedView::default()
        };

        match requested {
            Some(ViewId::Saved(view_id)) => {
                resolved.current = self
                    .views
                    .get_effective_view(actor, grid_key, Some(view_id))
                    .await?;
                if resolved.current.is_none() {
                    debug!(grid_key, view_id, "falling back to default system view");
                    resolved.system = grid.default_system_view().cloned();
                }
            }
            Some(ViewId::System(key)) => {
                resolved.system = grid
                    .system_view(&key)
                    .or_else(|| grid.default_system_view())
                    .cloned();
            }
            None => resolved.system = grid.default_system_view().cloned(),
        }

        Ok(resolved)
    }
}

impl ResolvedView {
    pub(super) fn defaults(&self) -> SystemViewDefaults {
        self.system
            .as_ref()
            .map(SystemView::defaults)
            .unwrap_or_default()
    }

    /// URL search, then the system default, then the saved view's search.
    pub(super) fn search_term(&self, request: &GridRequest, defaults: &SystemViewDefaults) -> String {
        let term = request.search.clone().unwrap_or_default();
        if is_truthy(&term) || request.dirty.search {
            return term;
        }

        if let Some(search) = defaults.search.as_ref().filter(|search| is_truthy(search)) {
            return search.clone();
        }

        self.current
            .as_ref()
            .and_then(|view| view.config().saved_search())
            .unwrap_or(term)
    }

    /// System-view expression, then the saved view's expression or flat filters.
    pub(super) fn view_conditions(&self, table: &str, dirty_filters: bool) -> Vec<NativeExpression> {
        if dirty_filters {
            return Vec::new();
        }

        let mut conditions = Vec::new();
        if let Some(expression) = self
            .system
            .as_ref()
            .and_then(|system| system.config.expression.as_ref())
        {
            conditions.extend(compile_expression(expression, table));
        }

        if let Some(view) = &self.current {
            let config = view.config();
            let compiled = config
                .expression
                .as_ref()
                .and_then(|expression| compile_expression(expression, table))
                .or_else(|| compile_flat(config).qualified(table).into_expression());
            conditions.extend(compiled);
        }

        conditions
    }

    pub(super) fn page_size(&self, grid: &GridDefinition) -> u32 {
        self.current
            .as_ref()
            .map_or(grid.default_page_size, |view| view.config().page_size)
    }
}
