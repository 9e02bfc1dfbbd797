//! Prompt templates for recipe extraction.

/// Default prompt for turning free text into a structured recipe.
///
/// The model must answer with a single JSON object and no surrounding prose;
/// the parser tolerates code fences but nothing else.
pub const DEFAULT_EXTRACT_PROMPT: &str = r#"Extract a structured recipe from the text below.

Respond with ONLY a single JSON object, no explanations, matching this shape:
{
  "title": "string (required)",
  "description": "string or omit",
  "source_url": "string or omit",
  "servings": integer or omit,
  "prep_minutes": integer or omit,
  "cook_minutes": integer or omit,
  "tags": ["lowercase strings"],
  "steps": ["one instruction per entry, in order"],
  "ingredients": [
    {
      "name": "ingredient name as written",
      "quantity": number or omit,
      "unit": "string or omit",
      "is_optional": boolean,
      "preparation_notes": "string or omit"
    }
  ]
}

Text:
{text}"#;
