//! Request handlers for the dashboard.
//!
//! Validation errors re-render the submitted form with messages beside the
//! inputs. Constraint errors become a form-level message. Everything else
//! goes through [`DashboardError`].

use axum::{
    Form, Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use clubhouse_core::{Category, ClubError, MemberFilter, MemberId, MemberPatch};
use clubhouse_spreadsheet::{
    ImportMapping, PREFIX_ALL, PREFIX_FILTERED, SHEET_ALL, SHEET_FILTERED, SHEET_MEMBERS,
    Workbook, export_filename, export_members, import_sheet,
};
use uuid::Uuid;

use crate::error::DashboardError;
use crate::forms::{
    FieldErrors, FormData, member_form_data, parse_categories, parse_filter, parse_mapping_form,
    parse_member_form, value,
};
use crate::pages::{self, MemberFormView, MembersView};
use crate::pages_extra::{self, MappingView, SettingsView};
use crate::state::AppState;

type HandlerResult = Result<Response, DashboardError>;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

async fn club_name(state: &AppState) -> Result<Option<String>, DashboardError> {
    Ok(state.services().settings.club_name().await?)
}

fn notice_message(code: &str) -> Option<&'static str> {
    match code {
        "created" => Some("Saved a new entry."),
        "updated" => Some("Changes saved."),
        "deleted" => Some("Deleted."),
        _ => None,
    }
}

fn rejected(html: String) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response()
}

// =============================================================================
// Home and setup
// =============================================================================

/// Handler for the home page, or first-run setup while the club is unnamed.
pub async fn home(State(state): State<AppState>) -> HandlerResult {
    let Some(club) = club_name(&state).await? else {
        return Ok(Html(pages::setup_page("", None)).into_response());
    };
    let services = state.services();
    let counts = services.members.category_counts().await?;
    let fields = services.fields.list_fields().await?;
    Ok(Html(pages::home_page(&club, &counts, fields.len())).into_response())
}

pub async fn setup(State(state): State<AppState>, Form(form): Form<FormData>) -> HandlerResult {
    let name = value(&form, "club_name");
    match state.services().settings.set_club_name(name).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(ClubError::Validation { message, .. }) => {
            Ok(rejected(pages::setup_page(name, Some(&message))))
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Members
// =============================================================================

/// Handler for the member list.
pub async fn members_list(
    State(state): State<AppState>,
    Query(query): Query<FormData>,
) -> HandlerResult {
    let services = state.services();
    let (filter, errors) = parse_filter(&query);
    let members = services.members.list(filter.clone()).await?;
    let counts = services.members.category_counts().await?;
    let fields = services.fields.list_fields().await?;
    let club = club_name(&state).await?;

    Ok(Html(pages::members_page(&MembersView {
        club: club.as_deref(),
        members: &members,
        fields: &fields,
        counts: &counts,
        query: &query,
        filter: &filter,
        errors: &errors,
        notice: notice_message(value(&query, "notice")),
    }))
    .into_response())
}

async fn member_form(
    state: &AppState,
    member_id: Option<MemberId>,
    category: Category,
    form: &FormData,
    errors: &FieldErrors,
    form_error: Option<&str>,
) -> Result<String, DashboardError> {
    let fields = state.services().fields.fields_for_category(category).await?;
    let club = club_name(state).await?;
    Ok(pages::member_form_page(&MemberFormView {
        club: club.as_deref(),
        member_id,
        category,
        form,
        fields: &fields,
        errors,
        form_error,
    }))
}

/// Re-render the form for a failed create or update.
async fn member_form_failed(
    state: &AppState,
    member_id: Option<MemberId>,
    category: Category,
    form: &FormData,
    error: ClubError,
) -> HandlerResult {
    let mut errors = FieldErrors::default();
    let form_error = match errors.absorb(error) {
        Ok(()) => None,
        Err(ClubError::Constraint(message)) => Some(message),
        Err(other) => return Err(other.into()),
    };
    let html = member_form(state, member_id, category, form, &errors, form_error.as_deref()).await?;
    Ok(rejected(html))
}

/// Handler for the add form.
pub async fn member_new(
    State(state): State<AppState>,
    Query(query): Query<FormData>,
) -> HandlerResult {
    let category = Category::parse(value(&query, "category")).unwrap_or(Category::Members);
    let form = FormData::from([("category".to_string(), category.slug().to_string())]);
    let html = member_form(&state, None, category, &form, &FieldErrors::default(), None).await?;
    Ok(Html(html).into_response())
}

pub async fn member_create(
    State(state): State<AppState>,
    Form(form): Form<FormData>,
) -> HandlerResult {
    let category = Category::parse(value(&form, "category")).unwrap_or(Category::Members);
    let draft = match parse_member_form(&form) {
        Ok(draft) => draft,
        Err(errors) => {
            let html = member_form(&state, None, category, &form, &errors, None).await?;
            return Ok(rejected(html));
        }
    };
    match state.services().members.create(draft).await {
        Ok(member) => Ok(Redirect::to(&format!(
            "/members?category={}&notice=created",
            member.category().slug()
        ))
        .into_response()),
        Err(e) => member_form_failed(&state, None, category, &form, e).await,
    }
}

/// Handler for the edit form.
pub async fn member_edit(
    State(state): State<AppState>,
    Path(member_id): Path<MemberId>,
) -> HandlerResult {
    let member = state.services().members.get(member_id).await?;
    let form = member_form_data(&member);
    let html = member_form(
        &state,
        Some(member_id),
        member.category(),
        &form,
        &FieldErrors::default(),
        None,
    )
    .await?;
    Ok(Html(html).into_response())
}

pub async fn member_update(
    State(state): State<AppState>,
    Path(member_id): Path<MemberId>,
    Form(form): Form<FormData>,
) -> HandlerResult {
    let services = state.services();
    let current = services.members.get(member_id).await?;
    let category = Category::parse(value(&form, "category")).unwrap_or(current.category());
    let draft = match parse_member_form(&form) {
        Ok(draft) => draft,
        Err(errors) => {
            let html = member_form(&state, Some(member_id), category, &form, &errors, None).await?;
            return Ok(rejected(html));
        }
    };

    // The form still carries inputs for the old category's fields.
    let applicable = services.fields.fields_for_category(draft.category()).await?;
    let attributes = draft
        .attributes
        .into_iter()
        .filter(|(id, _)| applicable.iter().any(|f| f.id == *id))
        .collect();
    let patch = MemberPatch {
        first_name: Some(draft.first_name),
        last_name: Some(draft.last_name),
        phone: Some(draft.phone),
        email: Some(draft.email),
        status: Some(draft.status),
        year: Some(draft.year),
        details: Some(draft.details),
        attributes,
    };
    match services.members.update(member_id, patch).await {
        Ok(member) => Ok(Redirect::to(&format!(
            "/members?category={}&notice=updated",
            member.category().slug()
        ))
        .into_response()),
        Err(e) => member_form_failed(&state, Some(member_id), category, &form, e).await,
    }
}

pub async fn member_delete(
    State(state): State<AppState>,
    Path(member_id): Path<MemberId>,
) -> HandlerResult {
    state.services().members.delete(member_id).await?;
    Ok(Redirect::to("/members?notice=deleted").into_response())
}

// =============================================================================
// Export
// =============================================================================

/// Download members as `.xlsx`. `scope=all` ignores the other parameters;
/// `scope=filtered` applies the list filters.
pub async fn export(State(state): State<AppState>, Query(query): Query<FormData>) -> HandlerResult {
    let services = state.services();
    let (filter, sheet_name, prefix) = match value(&query, "scope") {
        "all" => (MemberFilter::default(), SHEET_ALL, PREFIX_ALL),
        "filtered" | "" => {
            let (filter, _) = parse_filter(&query);
            let sheet = match filter.category {
                Some(c) if filter == MemberFilter::for_category(c) => SHEET_MEMBERS,
                _ => SHEET_FILTERED,
            };
            (filter, sheet, PREFIX_FILTERED)
        }
        other => {
            return Err(DashboardError::InvalidRequest(format!(
                "unknown export scope '{}'",
                other
            )));
        }
    };

    let members = services.members.list(filter).await?;
    let fields = services.fields.list_fields().await?;
    let bytes = export_members(&members, &fields, sheet_name)?;
    let file_name = export_filename(prefix, chrono::Local::now().naive_local());
    tracing::info!(rows = members.len(), file = %file_name, "Export downloaded");

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

// =============================================================================
// Import
// =============================================================================

/// Handler for the upload page.
pub async fn import_form(State(state): State<AppState>) -> HandlerResult {
    let club = club_name(&state).await?;
    Ok(Html(pages_extra::import_upload_page(
        club.as_deref(),
        state.config().max_upload_bytes,
        None,
    ))
    .into_response())
}

pub async fn import_upload(State(state): State<AppState>, mut multipart: Multipart) -> HandlerResult {
    let limit = state.config().max_upload_bytes;
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut failure: Option<String> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                let file_name = field.file_name().unwrap_or("upload.xlsx").to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((file_name, bytes.to_vec())),
                    Err(e) => {
                        failure = Some(upload_error(e.status(), &e.body_text(), limit));
                        break;
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                failure = Some(upload_error(e.status(), &e.body_text(), limit));
                break;
            }
        }
    }

    let result = match (failure, upload) {
        (Some(message), _) => Err(message),
        (None, Some((_, bytes))) if bytes.is_empty() => Err("choose a file to upload".to_string()),
        (None, None) => Err("choose a file to upload".to_string()),
        (None, Some((file_name, bytes))) => match Workbook::from_bytes(&bytes) {
            Ok(workbook) if workbook.first_sheet().is_some() => Ok((file_name, workbook)),
            Ok(_) => Err("the workbook has no sheets".to_string()),
            Err(e) => Err(e.to_string()),
        },
    };

    match result {
        Ok((file_name, workbook)) => {
            tracing::info!(file = %file_name, sheets = workbook.sheet_names().len(), "Workbook uploaded");
            let token = state.store_upload(file_name, workbook).await;
            Ok(Redirect::to(&format!("/import/{}", token)).into_response())
        }
        Err(message) => {
            tracing::warn!(error = %message, "Upload rejected");
            let club = club_name(&state).await?;
            Ok((
                StatusCode::BAD_REQUEST,
                Html(pages_extra::import_upload_page(club.as_deref(), limit, Some(&message))),
            )
                .into_response())
        }
    }
}

fn upload_error(status: StatusCode, body: &str, limit: usize) -> String {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        format!("the file is larger than {} KiB", limit / 1024)
    } else {
        format!("the upload could not be read: {}", body)
    }
}

async fn mapping_page(
    state: &AppState,
    token: Uuid,
    sheet_name: Option<&str>,
    mapping: Option<ImportMapping>,
    errors: &FieldErrors,
    form_error: Option<&str>,
) -> Result<String, DashboardError> {
    let upload = state
        .upload(token)
        .await
        .ok_or_else(|| DashboardError::NotFound(format!("upload {}", token)))?;
    let sheet = match sheet_name.filter(|n| !n.is_empty()) {
        Some(name) => upload.workbook.sheet(name)?,
        None => upload
            .workbook
            .first_sheet()
            .ok_or_else(|| DashboardError::InvalidRequest("the workbook has no sheets".into()))?,
    };
    let fields = state.services().fields.list_fields().await?;
    let mapping = mapping.unwrap_or_else(|| ImportMapping::suggest(&sheet.headers, &fields));
    let club = club_name(state).await?;

    Ok(pages_extra::import_mapping_page(&MappingView {
        club: club.as_deref(),
        token,
        file_name: &upload.file_name,
        sheet_names: &upload.workbook.sheet_names(),
        sheet,
        mapping: &mapping,
        fields: &fields,
        errors,
        form_error,
    }))
}

/// Handler for the mapping form of an uploaded workbook.
pub async fn import_mapping(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    Query(query): Query<FormData>,
) -> HandlerResult {
    let html = mapping_page(
        &state,
        token,
        Some(value(&query, "sheet")),
        None,
        &FieldErrors::default(),
        None,
    )
    .await?;
    Ok(Html(html).into_response())
}

pub async fn import_run(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    Form(form): Form<FormData>,
) -> HandlerResult {
    let upload = state
        .upload(token)
        .await
        .ok_or_else(|| DashboardError::NotFound(format!("upload {}", token)))?;
    let sheet_name = value(&form, "sheet");
    let sheet = match sheet_name {
        "" => upload
            .workbook
            .first_sheet()
            .ok_or_else(|| DashboardError::InvalidRequest("the workbook has no sheets".into()))?,
        name => upload.workbook.sheet(name)?,
    };
    let mapping = parse_mapping_form(&form);
    let services = state.services();

    match import_sheet(&services.members, &services.fields, sheet, &mapping).await {
        Ok(report) => {
            state.finish_upload(token).await;
            let club = club_name(&state).await?;
            Ok(Html(pages_extra::import_report_page(
                club.as_deref(),
                &upload.file_name,
                &sheet.name,
                &report,
            ))
            .into_response())
        }
        Err(e) => {
            let mut errors = FieldErrors::default();
            let form_error = match errors.absorb(e) {
                Ok(()) => None,
                Err(e @ ClubError::NotFound { .. }) => Some(format!("{}, please refresh", e)),
                Err(other) => return Err(other.into()),
            };
            let html = mapping_page(
                &state,
                token,
                Some(&sheet.name),
                Some(mapping),
                &errors,
                form_error.as_deref(),
            )
            .await?;
            Ok(rejected(html))
        }
    }
}

// =============================================================================
// Custom fields
// =============================================================================

/// Handler for the custom field list.
pub async fn fields_list(
    State(state): State<AppState>,
    Query(query): Query<FormData>,
) -> HandlerResult {
    let fields = state.services().fields.list_fields().await?;
    let club = club_name(&state).await?;
    Ok(Html(pages_extra::fields_page(
        club.as_deref(),
        &fields,
        &FormData::new(),
        &FieldErrors::default(),
        notice_message(value(&query, "notice")),
    ))
    .into_response())
}

pub async fn fields_create(
    State(state): State<AppState>,
    Form(form): Form<FormData>,
) -> HandlerResult {
    let engine = &state.services().fields;
    match engine
        .define_field(value(&form, "label"), parse_categories(&form))
        .await
    {
        Ok(_) => Ok(Redirect::to("/fields?notice=created").into_response()),
        Err(e) => {
            let mut errors = FieldErrors::default();
            errors.absorb(e)?;
            let fields = engine.list_fields().await?;
            let club = club_name(&state).await?;
            Ok(rejected(pages_extra::fields_page(
                club.as_deref(),
                &fields,
                &form,
                &errors,
                None,
            )))
        }
    }
}

pub async fn fields_delete(
    State(state): State<AppState>,
    Path(field_id): Path<i32>,
) -> HandlerResult {
    state.services().fields.delete_field(field_id).await?;
    Ok(Redirect::to("/fields?notice=deleted").into_response())
}

// =============================================================================
// Settings
// =============================================================================

async fn settings_view(
    state: &AppState,
    input: Option<&str>,
    errors: &FieldErrors,
    notice: Option<&str>,
) -> Result<String, DashboardError> {
    let club = club_name(state).await?;
    let pending = state.pending_uploads().await;
    Ok(pages_extra::settings_page(&SettingsView {
        club: club.as_deref(),
        club_name_input: input.or(club.as_deref()).unwrap_or(""),
        project_url: state.project_url(),
        config: state.config(),
        pending_uploads: pending,
        errors,
        notice,
    }))
}

/// Handler for the settings page.
pub async fn settings(
    State(state): State<AppState>,
    Query(query): Query<FormData>,
) -> HandlerResult {
    let notice = notice_message(value(&query, "notice"));
    let html = settings_view(&state, None, &FieldErrors::default(), notice).await?;
    Ok(Html(html).into_response())
}

pub async fn settings_save(
    State(state): State<AppState>,
    Form(form): Form<FormData>,
) -> HandlerResult {
    let name = value(&form, "club_name");
    match state.services().settings.set_club_name(name).await {
        Ok(_) => Ok(Redirect::to("/settings?notice=updated").into_response()),
        Err(e) => {
            let mut errors = FieldErrors::default();
            errors.absorb(e)?;
            let html = settings_view(&state, Some(name), &errors, None).await?;
            Ok(rejected(html))
        }
    }
}

// =============================================================================
// Health
// =============================================================================

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = match state.services().store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            "unreachable"
        }
    };
    Json(serde_json::json!({
        "status": "ok",
        "service": "clubhouse",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
    }))
}
