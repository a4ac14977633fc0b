/// Literal shape the model must answer with.
pub const RESPONSE_SCHEMA: &str = r#"{"capitulo":{"titulo":"<chapter title>","Total_Subcapitulos":<number of parts>,"subtemas":[{"title":"<subchapter title>","texto":"<verbatim source text of this part>","descripcion":"<one sentence describing this part>"}, ...]}}"#;

/// Instruction asking the model to cut `chapter_text` into exactly
/// `target_count` verbatim parts of roughly equal length.
pub fn build_prompt(chapter_text: &str, chapter_title: &str, target_count: usize) -> String {
    let parts = target_count.max(1);
    let approx_len = chapter_text.chars().count() / parts;
    let noun = if parts == 1 { "part" } else { "parts" };

    format!(
        "You are splitting the chapter \"{title}\" of a document into subchapters.\n\
         \n\
         Rules:\n\
         1. Split the text into exactly {parts} {noun}, in reading order, each about {approx_len} characters long.\n\
         2. Do not summarize, paraphrase, translate or correct anything.\n\
         3. Copy the source text verbatim into each part; every sentence must appear in exactly one part.\n\
         4. Give each part a short human-readable title and a one-sentence description.\n\
         5. Lines such as \"--- Page N ---\" are page markers, not content.\n\
         \n\
         Answer with a single JSON object using exactly this schema:\n\
         {schema}\n\
         \n\
         \"Total_Subcapitulos\" must be {parts} and \"subtemas\" must contain {parts} entries.\n\
         Respond with the raw JSON only. Do not wrap it in Markdown code fences (```), and do not add any text before or after it.\n\
         \n\
         Text:\n\
         {text}",
        title = chapter_title,
        parts = parts,
        noun = noun,
        approx_len = approx_len,
        schema = RESPONSE_SCHEMA,
        text = chapter_text,
    )
}
