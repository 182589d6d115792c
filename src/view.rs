//! Server-rendered pages (askama templates under `templates/`).

use askama::Template;
use axum::response::Html;
use reqwest::Url;

use crate::errors::AppError;
use crate::gallery::GalleryState;
use crate::models::{ApprovalForm, FieldErrors, Suggestion};

pub const SUGGESTIONS_PATH: &str = "/suggestions";

pub struct Breadcrumb {
    pub href: String,
    pub name: String,
}

/// suggestion_href
///
/// Path of a suggestion page, or of one of its actions when `action` is given.
/// The id is pushed as a single percent-encoded segment, so `/`, `?` and `#`
/// inside it can never point the link at another route.
pub fn suggestion_href(id: &str, action: Option<&str>) -> String {
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return SUGGESTIONS_PATH.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push("suggestions").push(id).extend(action);
    }
    url.path().to_string()
}

fn suggestion_breadcrumbs(id: &str) -> Vec<Breadcrumb> {
    vec![
        Breadcrumb {
            href: SUGGESTIONS_PATH.to_string(),
            name: "Suggestions".to_string(),
        },
        Breadcrumb {
            href: suggestion_href(id, None),
            name: "View Suggestion".to_string(),
        },
    ]
}

/// One input of the product form.
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub multiline: bool,
    pub value: String,
    pub error: Option<String>,
}

/// ProductFormView
///
/// Values shown in the product creation form. Field names are the wire names of
/// `ApprovalForm`.
pub struct ProductFormView {
    pub name: String,
    pub price: String,
    pub ingredients_list: String,
    pub barcode_format: String,
    pub barcode: String,
    pub manufacturing_location: String,
    pub packaging_location: String,
    pub transport_weight: String,
    pub company_rating: String,
    pub packaging_rating: String,
    pub overall_rating: String,
}

const DEFAULT_SCORE: &str = "5";

/// Field names rendered by the form, in display order.
pub const FORM_FIELDS: [&str; 11] = [
    "name",
    "price",
    "ingredientsList",
    "barcodeFormat",
    "barcode",
    "manufacturingLocation",
    "packagingLocation",
    "transportWeight",
    "companyRating",
    "packagingRating",
    "overallRating",
];

impl ProductFormView {
    /// Pre-filled from the suggestion; weight and ratings default to 5.
    pub fn initial(suggestion: &Suggestion) -> Self {
        Self {
            name: String::new(),
            price: suggestion.price.to_string(),
            ingredients_list: String::new(),
            barcode_format: suggestion.format.clone(),
            barcode: suggestion.code.clone(),
            manufacturing_location: String::new(),
            packaging_location: String::new(),
            transport_weight: DEFAULT_SCORE.to_string(),
            company_rating: DEFAULT_SCORE.to_string(),
            packaging_rating: DEFAULT_SCORE.to_string(),
            overall_rating: DEFAULT_SCORE.to_string(),
        }
    }

    /// What the admin typed, for re-rendering after a failed approve.
    pub fn from_submission(form: &ApprovalForm) -> Self {
        Self {
            name: form.name.clone(),
            price: form.price.clone(),
            ingredients_list: form.ingredients_list.clone(),
            barcode_format: form.barcode_format.clone(),
            barcode: form.barcode.clone(),
            manufacturing_location: form.manufacturing_location.clone(),
            packaging_location: form.packaging_location.clone(),
            transport_weight: form.transport_weight.clone(),
            company_rating: form.company_rating.clone(),
            packaging_rating: form.packaging_rating.clone(),
            overall_rating: form.overall_rating.clone(),
        }
    }

    fn fields(self, errors: &FieldErrors) -> Vec<FormField> {
        let field = |name: &'static str, label, input_type, value: String| FormField {
            name,
            label,
            input_type,
            multiline: false,
            value,
            error: errors.message_for(name).map(str::to_string),
        };

        vec![
            field("name", "Name", "text", self.name),
            field("price", "Price", "text", self.price),
            FormField {
                multiline: true,
                ..field(
                    "ingredientsList",
                    "Ingredients (one per line)",
                    "text",
                    self.ingredients_list,
                )
            },
            field("barcodeFormat", "Barcode format", "text", self.barcode_format),
            field("barcode", "Barcode", "text", self.barcode),
            field(
                "manufacturingLocation",
                "Manufacturing location",
                "text",
                self.manufacturing_location,
            ),
            field(
                "packagingLocation",
                "Packaging location",
                "text",
                self.packaging_location,
            ),
            field("transportWeight", "Transport weight", "text", self.transport_weight),
            field("companyRating", "Company rating", "number", self.company_rating),
            field("packagingRating", "Packaging rating", "number", self.packaging_rating),
            field("overallRating", "Overall rating", "number", self.overall_rating),
        ]
    }
}

/// SuggestionPage
///
/// The moderation page: header with the reject action, photo gallery and the
/// pre-filled product form that approves the suggestion.
#[derive(Template)]
#[template(path = "suggestion.html")]
pub struct SuggestionPage {
    pub title: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub reject_url: String,
    pub approve_url: String,
    pub images: Vec<String>,
    pub images_loading: bool,
    pub gallery_error: Option<String>,
    pub fields: Vec<FormField>,
    pub general_errors: Vec<String>,
    pub submit_label: &'static str,
}

impl SuggestionPage {
    pub fn new(
        suggestion: &Suggestion,
        gallery: GalleryState,
        form: ProductFormView,
        errors: &FieldErrors,
    ) -> Self {
        let (images, images_loading, gallery_error) = match gallery {
            GalleryState::Loading => (Vec::new(), true, None),
            GalleryState::Ready(urls) => (urls.into_iter().map(|u| u.url).collect(), false, None),
            GalleryState::Failed(_) => (
                Vec::new(),
                false,
                Some("The photos for this suggestion could not be loaded.".to_string()),
            ),
        };

        Self {
            title: suggestion.title(),
            breadcrumbs: suggestion_breadcrumbs(&suggestion.id),
            reject_url: suggestion_href(&suggestion.id, Some("reject")),
            approve_url: suggestion_href(&suggestion.id, Some("approve")),
            images,
            images_loading,
            gallery_error,
            fields: form.fields(errors),
            general_errors: errors.unplaced(&FORM_FIELDS),
            submit_label: "Add Suggestion",
        }
    }
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundPage {
    pub title: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub message: String,
}

impl NotFoundPage {
    pub fn for_suggestion(id: &str) -> Self {
        Self {
            title: "Suggestion not found".to_string(),
            breadcrumbs: suggestion_breadcrumbs(id),
            message: format!("No suggestion with id \"{id}\" is awaiting moderation."),
        }
    }
}

pub fn render<T: Template>(template: T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}
