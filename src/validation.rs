//! Submission validation.
//!
//! Pure field checks applied to a raw form submission before anything
//! touches the backend. No I/O happens here.

use crate::report::Category;

pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 5000;
pub const USERNAME_MAX: usize = 100;
pub const LOCATION_MAX: usize = 255;
/// 5 MiB
pub const IMAGE_MAX_BYTES: usize = 5_242_880;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
const IMAGE_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// An uploaded image file, as read from the multipart payload.
///
/// `size` is the total number of bytes streamed, which may exceed
/// `data.len()` when the reader stopped buffering an oversized upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub size: usize,
}

/// Raw form fields exactly as submitted, before any validation.
#[derive(Debug, Default)]
pub struct RawSubmission {
    pub description: String,
    pub category: String,
    pub username: String,
    pub location: String,
    pub image: Option<ImageUpload>,
}

/// A submission that passed all field checks. The description is trimmed
/// and empty optional fields are normalized to `None`.
#[derive(Debug)]
pub struct Submission {
    pub description: String,
    pub category: Option<Category>,
    pub username: Option<String>,
    pub location: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Per-field validation errors. `None` means the field is fine.
#[derive(Debug, Default, Clone)]
pub struct FieldErrors {
    pub description: Option<String>,
    pub category: Option<String>,
    pub username: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.category.is_none()
            && self.username.is_none()
            && self.location.is_none()
            && self.image.is_none()
    }
}

/// Validate a raw submission.
///
/// Returns the normalized submission, or the per-field errors to
/// re-present on the form.
pub fn validate(raw: RawSubmission) -> Result<Submission, FieldErrors> {
    let mut errors = FieldErrors::default();

    // Limits are in characters, not bytes; multibyte text counts the
    // same as ASCII.
    let description = raw.description.trim().to_string();
    if raw.description.chars().count() > DESCRIPTION_MAX {
        errors.description = Some(format!(
            "Description must be under {} characters",
            DESCRIPTION_MAX
        ));
    } else if description.chars().count() < DESCRIPTION_MIN {
        errors.description = Some(format!(
            "Description must be at least {} characters long",
            DESCRIPTION_MIN
        ));
    }

    let category = match raw.category.trim() {
        // Empty selection is "no category", not an error.
        "" => None,
        value => match Category::parse(value) {
            Some(category) => Some(category),
            None => {
                errors.category = Some("Invalid category".to_string());
                None
            }
        },
    };

    if raw.username.chars().count() > USERNAME_MAX {
        errors.username = Some(format!("Name must be under {} characters", USERNAME_MAX));
    }
    if raw.location.chars().count() > LOCATION_MAX {
        errors.location = Some(format!("Location must be under {} characters", LOCATION_MAX));
    }

    if let Some(image) = &raw.image {
        errors.image = check_image(image);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Submission {
        description,
        category,
        username: none_if_empty(raw.username),
        location: none_if_empty(raw.location),
        image: raw.image,
    })
}

/// Image constraints: size, declared content type, and file extension.
fn check_image(image: &ImageUpload) -> Option<String> {
    if image.size > IMAGE_MAX_BYTES {
        return Some("Image file size must be under 5MB".to_string());
    }

    if !IMAGE_MIME_TYPES.contains(&image.content_type.as_str()) {
        return Some("Only JPEG, PNG, GIF, and WebP images are allowed".to_string());
    }

    let extension = file_extension(&image.filename);
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Some("Only JPEG, PNG, GIF, and WebP images are allowed".to_string());
    }

    None
}

/// Lowercased extension of a filename, or an empty string if it has none.
pub fn file_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

fn none_if_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
