//! Prompt construction for website generation

const INSTRUCTIONS: &str = "\
You are an expert web app developer and UI designer specializing in minimalist, clean designs.
Your task: Generate a beautiful, modern, and minimalistic single-page web app using only HTML, CSS, and minimal JavaScript.
Requirements:
- Create a MINIMALIST design with clean typography, ample whitespace, and subtle effects
- Use best practices for accessibility, responsiveness, and performance
- Focus on simplicity, readability and usability
- Use modern CSS (Flexbox/Grid) but keep visual elements minimal
- Avoid unnecessary frameworks, libraries, or decorative elements
- Use a monochromatic or limited color palette
- ALL images/icons must be inline SVG (no external images or links)
- The HTML must be fully self-contained with NO external dependencies or CDN links
- If you generate navigation or tabs, do NOT use anchor links or change the URL. Use JavaScript to show/hide content sections for tab navigation. All navigation must be fully client-side and must not reload or redirect the page.
- Return ONLY the complete HTML/CSS/JS code block, no explanations
- The code should be ready to copy-paste and run
";

const CURRENT_VERSION_LABEL: &str = "Here is the current version of the website code:";

/// Build the model prompt from the current document and the newest request.
///
/// Only these two pieces of context are sent, never the whole chat history,
/// so the payload stays roughly the same size however long the session runs.
pub fn build_prompt(prior_artifact: Option<&str>, latest_user_message: &str) -> String {
    let mut prompt = String::with_capacity(
        INSTRUCTIONS.len() + latest_user_message.len() + prior_artifact.map_or(0, str::len) + 128,
    );

    prompt.push_str(INSTRUCTIONS);
    prompt.push('\n');
    prompt.push_str("Conversation:\n");

    if let Some(artifact) = prior_artifact {
        prompt.push_str("ASSISTANT: ");
        prompt.push_str(CURRENT_VERSION_LABEL);
        prompt.push_str("\n\n");
        prompt.push_str(artifact.trim());
        prompt.push('\n');
    }

    prompt.push_str("USER: ");
    prompt.push_str(latest_user_message);

    prompt
}
