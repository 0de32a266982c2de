//! System prompts sent to the completion service.

/// Asks whether a text contains a recipe and which categories apply.
pub const CLASSIFIER_PROMPT: &str = "You are a classifier. Determine if the following text contains a cooking recipe \
and select high-level food categories such as soup, meat, fish, vegetables, fermentation, desserts, experiments, beverages.\n\
Return JSON: {\"is_recipe\": true|false, \"categories\": [\"soup\", \"meat\", ...]}.\n\
Use lowercase categories; return empty list if uncertain.";

/// Requests a single structured recipe object.
pub const EXTRACTION_PROMPT: &str = "Extract a structured cooking recipe from the text.\n\
Output strictly in the following JSON format:\n\n\
{\n\
  \"title\": \"\",\n\
  \"ingredients\": [],\n\
  \"steps\": [],\n\
  \"time\": \"\",\n\
  \"temperature\": \"\",\n\
  \"notes\": \"\"\n\
}";

/// Requests every distinct recipe in the text as a JSON array.
pub const MULTI_EXTRACTION_PROMPT: &str = "Extract every distinct cooking recipe from the text. Output a JSON array where each item matches:\n\
{\n\
  \"title\": \"\",\n\
  \"ingredients\": [],\n\
  \"steps\": [],\n\
  \"time\": \"\",\n\
  \"temperature\": \"\",\n\
  \"notes\": \"\"\n\
}\n\
Return at least one item only if there is a recipe; otherwise return an empty array [].";

/// Repair pass for candidates that failed the completeness check.
pub const COMPLETION_PROMPT: &str = "You are improving an incomplete recipe. Using the provided text, produce a complete cooking recipe. \
If details are missing, infer plausible ingredients and steps consistent with the dish. \
Output strictly in JSON with non-empty title, at least 5 ingredients, and at least 3 steps:\n\n\
{\n\
  \"title\": \"\",\n\
  \"ingredients\": [],\n\
  \"steps\": [],\n\
  \"time\": \"\",\n\
  \"temperature\": \"\",\n\
  \"notes\": \"\"\n\
}";
