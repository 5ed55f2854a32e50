//! Agent profiles
//!
//! Role and instructions for each hosted agent, folded into one system
//! prompt per call. Tools are described to the model; the hosted framework
//! runs them.

use crate::agent::AgentKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    StockData,
    WebSearch,
}

impl ToolKind {
    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::StockData => {
                "stock_data: stock price, analyst recommendations, stock fundamentals, \
                 company info, company news"
            }
            ToolKind::WebSearch => "web_search: real-time web search for news and market data",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AgentProfile {
    pub name: &'static str,
    pub tools: &'static [ToolKind],
    pub instructions: &'static [&'static str],
    /// Members whose roles are delegated to by this agent
    pub team: &'static [AgentProfile],
}

pub const FINANCIAL_ANALYST: AgentProfile = AgentProfile {
    name: "Financial Analyst Pro",
    tools: &[ToolKind::StockData],
    instructions: &[
        "You are a senior financial analyst with 20+ years of market experience",
        "For any stock analysis, always include:",
        "1. Current price and 52-week range",
        "2. Market capitalization",
        "3. Key ratios (P/E, P/S, Debt/Equity, ROE)",
        "4. Revenue and earnings growth (YoY and QoQ)",
        "5. Analyst price targets and recommendations",
        "",
        "Format all numbers properly:",
        "- Currency: $1.2B (not 1200000000)",
        "- Percentages: 5.3% (not 0.053)",
        "- Ratios: 12.5x (not 12.5)",
        "",
        "Create comparison tables for:",
        "- Valuation metrics",
        "- Growth rates",
        "- Profitability",
    ],
    team: &[],
};

pub const WEB_RESEARCHER: AgentProfile = AgentProfile {
    name: "Market Intelligence Specialist",
    tools: &[ToolKind::WebSearch],
    instructions: &[
        "You are a professional market researcher with access to real-time web data",
        "Always verify information from multiple sources",
        "Prioritize data from: Bloomberg, Reuters, WSJ, SEC filings, and company websites",
        "Include publication dates for all sourced information",
        "Format news with headlines, dates, and key points",
        "For market trends, identify:",
        "  - Key drivers and catalysts",
        "  - Major players and their market share",
        "  - Regulatory and macroeconomic factors",
        "Always end with source reliability assessment",
    ],
    team: &[],
};

pub const RESEARCH_TEAM: AgentProfile = AgentProfile {
    name: "Financial Research Team",
    tools: &[],
    instructions: &[
        "COLLABORATION PROTOCOL:",
        "1. Financial analyst handles all quantitative data and ratios",
        "2. Web researcher provides qualitative context and news",
        "3. Both agents cross-validate findings before final output",
        "",
        "OUTPUT REQUIREMENTS:",
        "- Start with executive summary (3-5 bullet points)",
        "- Include both fundamental and technical analysis",
        "- Present data in this order:",
        "  1. Company overview",
        "  2. Financial health assessment",
        "  3. Growth prospects",
        "  4. Competitive positioning",
        "  5. Risk factors",
        "- All tables must include:",
        "  - Timeframe reference",
        "  - Data source",
        "  - Calculation methodology when non-standard",
        "- Conclude with investment thesis and price targets if available",
    ],
    team: &[FINANCIAL_ANALYST, WEB_RESEARCHER],
};

pub const FINANCIAL_CHATBOT: AgentProfile = AgentProfile {
    name: "Financial Chatbot",
    tools: &[ToolKind::StockData, ToolKind::WebSearch],
    instructions: &[
        "You are a friendly financial assistant that helps users with investment research and market analysis",
        "Your responses should be conversational but professional",
        "When answering questions:",
        "1. First understand what the user is asking",
        "2. Provide clear, concise explanations of financial concepts when needed",
        "3. Use bullet points or numbered lists for complex information",
        "4. Always cite sources for factual information",
        "5. Offer to provide more details if the user seems interested",
        "",
        "For stock-related questions, always include:",
        "- Current price and key metrics",
        "- Recent performance",
        "- Any relevant news",
        "",
        "For general financial questions:",
        "- Explain concepts simply first",
        "- Then provide more technical details if appropriate",
        "- Use analogies when helpful",
        "",
        "Maintain a helpful, professional tone throughout the conversation",
    ],
    team: &[],
};

impl AgentProfile {
    pub fn for_kind(kind: AgentKind) -> &'static AgentProfile {
        match kind {
            AgentKind::ResearchTeam => &RESEARCH_TEAM,
            AgentKind::Chatbot => &FINANCIAL_CHATBOT,
        }
    }

    /// Build the system prompt: role, instructions, tools, then one block
    /// per team member.
    pub fn system_prompt(&self) -> String {
        let mut prompt = format!("Your name is {}.\n", self.name);
        self.push_body(&mut prompt);

        if !self.team.is_empty() {
            prompt.push_str("\nYou lead a team. Answer using the perspectives of:\n");
            for member in self.team {
                prompt.push_str(&format!("\n## {}\n", member.name));
                member.push_body(&mut prompt);
            }
        }

        prompt.push_str("\nRespond in markdown. Present tabular data as pipe-delimited markdown tables.");
        prompt
    }

    fn push_body(&self, prompt: &mut String) {
        prompt.push_str(&self.instructions.join("\n"));
        prompt.push('\n');

        if !self.tools.is_empty() {
            let tools: Vec<&str> = self.tools.iter().map(ToolKind::description).collect();
            prompt.push_str(&format!("\nAvailable tools:\n- {}\n", tools.join("\n- ")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_prompt_includes_members() {
        let prompt = AgentProfile::for_kind(AgentKind::ResearchTeam).system_prompt();

        assert!(prompt.contains("COLLABORATION PROTOCOL"));
        assert!(prompt.contains("## Financial Analyst Pro"));
        assert!(prompt.contains("## Market Intelligence Specialist"));
        assert!(prompt.contains("stock_data"));
        assert!(prompt.contains("web_search"));
    }

    #[test]
    fn test_chatbot_prompt_lists_both_tools() {
        let prompt = AgentProfile::for_kind(AgentKind::Chatbot).system_prompt();

        assert!(prompt.starts_with("Your name is Financial Chatbot."));
        assert!(prompt.contains("- stock_data"));
        assert!(prompt.contains("- web_search"));
        assert!(!prompt.contains("You lead a team"));
    }
}
